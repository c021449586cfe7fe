/*!
 * Fragment consolidation for a single band track.
 *
 * Raw tracks contain one cue per segmenter run, so a caption that flickered or
 * was split by a similarity dip shows up as several back-to-back cues with
 * nearly the same text. The consolidator:
 *
 * 1. drops cues with empty text
 * 2. merges runs of contiguous (`a.end == b.start`) cues whose texts score
 *    above the merge threshold, pairwise along the run
 * 3. spell-corrects the text kept for each merged run
 * 4. drops cues whose reading speed is implausible
 */

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::consolidation::fuzzy::{TextSimilarity, TokenSetMatcher};
use crate::consolidation::spelling::{IdentityCorrector, SpellCorrector};
use crate::subtitle_processor::{SubtitleEntry, renumber_entries};

/// Which fragment of a merged run provides the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentPolicy {
    /// Text of the first fragment
    #[default]
    First,
    /// Text of the fragment with the most non-space characters; earliest wins ties
    Longest,
}

impl std::fmt::Display for FragmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Longest => write!(f, "longest"),
        }
    }
}

impl std::str::FromStr for FragmentPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "longest" => Ok(Self::Longest),
            _ => Err(anyhow::anyhow!("Invalid fragment policy: {}", s)),
        }
    }
}

/// Consolidation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    /// Token-set ratio a contiguous pair must exceed to merge
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: u8,

    /// Cues must read strictly faster than this many characters per second
    #[serde(default = "default_min_cps")]
    pub min_cps: u64,

    /// Cues must read strictly slower than this many characters per second
    #[serde(default = "default_max_cps")]
    pub max_cps: u64,

    #[serde(default)]
    pub fragment_policy: FragmentPolicy,

    /// Also spell-correct cues that were not merged
    #[serde(default)]
    pub correct_unmerged: bool,

    /// Renumber surviving cues 1..N
    #[serde(default = "default_renumber")]
    pub renumber: bool,
}

fn default_merge_threshold() -> u8 {
    90
}

fn default_min_cps() -> u64 {
    1
}

fn default_max_cps() -> u64 {
    50
}

fn default_renumber() -> bool {
    true
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            merge_threshold: default_merge_threshold(),
            min_cps: default_min_cps(),
            max_cps: default_max_cps(),
            fragment_policy: FragmentPolicy::default(),
            correct_unmerged: false,
            renumber: default_renumber(),
        }
    }
}

/// Characters per second of a cue, truncated
///
/// `None` for zero-length or inverted cues.
pub fn characters_per_second(entry: &SubtitleEntry) -> Option<u64> {
    let duration_ms = entry.duration_ms();
    if duration_ms == 0 {
        return None;
    }
    Some(entry.non_space_chars() as u64 * 1000 / duration_ms)
}

/// Fragment consolidator
#[derive(Clone)]
pub struct Consolidator {
    config: ConsolidationConfig,
    similarity: Arc<dyn TextSimilarity>,
    corrector: Arc<dyn SpellCorrector>,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new(ConsolidationConfig::default())
    }
}

impl Consolidator {
    /// Consolidator with the token-set matcher and no spelling correction
    pub fn new(config: ConsolidationConfig) -> Self {
        Self::with_collaborators(config, Arc::new(TokenSetMatcher), Arc::new(IdentityCorrector))
    }

    pub fn with_collaborators(
        config: ConsolidationConfig,
        similarity: Arc<dyn TextSimilarity>,
        corrector: Arc<dyn SpellCorrector>,
    ) -> Self {
        Self {
            config,
            similarity,
            corrector,
        }
    }

    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Consolidate one band track
    pub fn consolidate(&self, entries: &[SubtitleEntry]) -> Vec<SubtitleEntry> {
        let non_empty: Vec<&SubtitleEntry> = entries.iter().filter(|e| !e.text.trim().is_empty()).collect();
        let dropped_empty = entries.len() - non_empty.len();

        let mut merged = Vec::with_capacity(non_empty.len());
        let mut run_start = 0;
        for i in 0..non_empty.len() {
            let continues = non_empty
                .get(i + 1)
                .is_some_and(|next| self.should_merge(non_empty[i], next));
            if !continues {
                merged.push(self.collapse(&non_empty[run_start..=i]));
                run_start = i + 1;
            }
        }
        let merged_count = non_empty.len() - merged.len();

        let before_filter = merged.len();
        let mut result: Vec<SubtitleEntry> = merged.into_iter().filter(|e| self.plausible(e)).collect();
        let dropped_cps = before_filter - result.len();

        if self.config.renumber {
            renumber_entries(&mut result);
        }

        debug!(
            "Consolidated {} cues into {} ({} empty, {} merged, {} implausible)",
            entries.len(),
            result.len(),
            dropped_empty,
            merged_count,
            dropped_cps
        );
        result
    }

    /// Whether `next` continues the run ending with `current`
    pub fn should_merge(&self, current: &SubtitleEntry, next: &SubtitleEntry) -> bool {
        if current.end_time_ms != next.start_time_ms {
            return false;
        }
        let a = current.text.trim().to_lowercase();
        let b = next.text.trim().to_lowercase();
        self.similarity.token_set_ratio(&a, &b) > self.config.merge_threshold
    }

    /// Whether the reading speed is within bounds
    pub fn plausible(&self, entry: &SubtitleEntry) -> bool {
        characters_per_second(entry).is_some_and(|cps| cps > self.config.min_cps && cps < self.config.max_cps)
    }

    fn collapse(&self, run: &[&SubtitleEntry]) -> SubtitleEntry {
        let (first, last) = match (run.first(), run.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return SubtitleEntry::new(0, 0, 0, String::new()),
        };

        if run.len() == 1 {
            let mut entry = first.clone();
            if self.config.correct_unmerged {
                entry.text = self.corrector.correct(&entry.text);
            }
            return entry;
        }

        let chosen = match self.config.fragment_policy {
            FragmentPolicy::First => first,
            FragmentPolicy::Longest => run
                .iter()
                .copied()
                .fold(first, |best, e| if e.non_space_chars() > best.non_space_chars() { e } else { best }),
        };

        SubtitleEntry::new(
            first.seq_num,
            first.start_time_ms,
            last.end_time_ms,
            self.corrector.correct(chosen.text.trim()),
        )
    }
}
