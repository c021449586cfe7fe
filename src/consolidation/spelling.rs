/*!
 * Spelling correction for consolidated captions.
 */

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

use crate::consolidation::fuzzy::levenshtein_distance;

/// Largest edit distance considered for a replacement
const MAX_EDIT_DISTANCE: usize = 2;

/// Spell correction; never fails, returns the input when unsure
pub trait SpellCorrector: Send + Sync {
    fn correct(&self, text: &str) -> String;
}

/// Corrector that changes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCorrector;

impl SpellCorrector for IdentityCorrector {
    fn correct(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Word-frequency dictionary corrector
///
/// Each alphabetic word missing from the dictionary is replaced by the closest
/// dictionary word within two edits, preferring fewer edits, then higher
/// frequency, then alphabetical order.
#[derive(Debug, Clone, Default)]
pub struct DictionaryCorrector {
    // @field: Lowercase word -> frequency
    frequencies: HashMap<String, u64>,
}

impl DictionaryCorrector {
    pub fn new(frequencies: HashMap<String, u64>) -> Self {
        let frequencies = frequencies
            .into_iter()
            .map(|(word, count)| (word.to_lowercase(), count))
            .collect();
        Self { frequencies }
    }

    /// Load a dictionary file
    ///
    /// One word per line, optionally followed by whitespace and a frequency.
    /// Lines starting with `#` are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary file: {:?}", path))?;
        let corrector = Self::parse(&content);
        debug!("Loaded {} dictionary words from {:?}", corrector.len(), path);
        Ok(corrector)
    }

    pub fn parse(content: &str) -> Self {
        let mut frequencies = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let count = parts.next().and_then(|c| c.parse::<u64>().ok()).unwrap_or(1);
            *frequencies.entry(word.to_lowercase()).or_insert(0) += count;
        }
        Self { frequencies }
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    fn correct_word(&self, word: &str) -> Option<String> {
        let lower = word.to_lowercase();
        if self.frequencies.contains_key(&lower) {
            return None;
        }
        let length = lower.chars().count();

        let (best, _, _) = self
            .frequencies
            .iter()
            .filter(|(candidate, _)| candidate.chars().count().abs_diff(length) <= MAX_EDIT_DISTANCE)
            .map(|(candidate, count)| (candidate, levenshtein_distance(&lower, candidate), *count))
            .filter(|(_, distance, _)| *distance <= MAX_EDIT_DISTANCE)
            .min_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)).then(a.0.cmp(b.0)))?;

        Some(match_case(word, best))
    }
}

impl SpellCorrector for DictionaryCorrector {
    fn correct(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut word = String::new();

        let flush = |word: &mut String, output: &mut String| {
            if !word.is_empty() {
                match self.correct_word(word) {
                    Some(replacement) => output.push_str(&replacement),
                    None => output.push_str(word),
                }
                word.clear();
            }
        };

        for c in text.chars() {
            if c.is_alphabetic() || c == '\'' {
                word.push(c);
            } else {
                flush(&mut word, &mut output);
                output.push(c);
            }
        }
        flush(&mut word, &mut output);

        output
    }
}

/// Apply the capitalization of `original` to the lowercase `replacement`
fn match_case(original: &str, replacement: &str) -> String {
    let mut chars = original.chars();
    let upper_count = original.chars().filter(|c| c.is_uppercase()).count();
    if upper_count > 1 && upper_count == original.chars().filter(|c| c.is_alphabetic()).count() {
        return replacement.to_uppercase();
    }
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            let mut rest = replacement.chars();
            match rest.next() {
                Some(r) => r.to_uppercase().chain(rest).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}
