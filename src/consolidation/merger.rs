/*!
 * Merging of the top and bottom tracks into one document.
 */

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::extraction::frame::Band;
use crate::subtitle_processor::{SubtitleEntry, renumber_entries};

/// How the two band tracks are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// All top cues followed by all bottom cues
    #[default]
    Concatenate,
    /// Stable sort by start, then end, then band (top first)
    TimeSorted,
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concatenate => write!(f, "concatenate"),
            Self::TimeSorted => write!(f, "time_sorted"),
        }
    }
}

impl std::str::FromStr for MergePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "concatenate" => Ok(Self::Concatenate),
            "time_sorted" | "sorted" => Ok(Self::TimeSorted),
            _ => Err(anyhow::anyhow!("Invalid merge policy: {}", s)),
        }
    }
}

/// Combines two band tracks into a document numbered 1..N
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackMerger {
    policy: MergePolicy,
}

impl TrackMerger {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn merge(&self, top: &[SubtitleEntry], bottom: &[SubtitleEntry]) -> Vec<SubtitleEntry> {
        let tagged = top
            .iter()
            .map(|e| (Band::Top, e))
            .chain(bottom.iter().map(|e| (Band::Bottom, e)));

        let mut merged: Vec<(Band, &SubtitleEntry)> = tagged.collect();
        if self.policy == MergePolicy::TimeSorted {
            // sort_by is stable, so equal keys keep their track order
            merged.sort_by(|(band_a, a), (band_b, b)| compare_cues(a, *band_a, b, *band_b));
        }

        let mut document: Vec<SubtitleEntry> = merged.into_iter().map(|(_, e)| e.clone()).collect();
        renumber_entries(&mut document);

        debug!(
            "Merged {} top and {} bottom cues ({})",
            top.len(),
            bottom.len(),
            self.policy
        );
        document
    }
}

fn compare_cues(a: &SubtitleEntry, band_a: Band, b: &SubtitleEntry, band_b: Band) -> Ordering {
    a.start_time_ms
        .cmp(&b.start_time_ms)
        .then(a.end_time_ms.cmp(&b.end_time_ms))
        .then(band_a.cmp(&band_b))
}
