/*!
 * Tests for fragment consolidation
 */

use std::collections::HashMap;
use std::sync::Arc;

use unembedder::consolidation::fuzzy::token_set_ratio;
use unembedder::consolidation::{
    characters_per_second, ConsolidationConfig, Consolidator, DictionaryCorrector, FragmentPolicy,
    SpellCorrector, TokenSetMatcher,
};
use crate::common::{entry, timings};

fn dictionary() -> Arc<DictionaryCorrector> {
    let words: HashMap<String, u64> = [("hello", 50), ("world", 40), ("there", 30), ("general", 5), ("kenobi", 1)]
        .into_iter()
        .map(|(w, c)| (w.to_string(), c))
        .collect();
    Arc::new(DictionaryCorrector::new(words))
}

/// Adjacent near-identical fragments merge into one corrected cue
#[test]
fn test_consolidate_withAdjacentSimilarFragments_shouldMergeAndCorrectFirst() {
    let consolidator = Consolidator::with_collaborators(
        ConsolidationConfig::default(),
        Arc::new(TokenSetMatcher),
        dictionary(),
    );
    let raw = vec![
        entry(1000, 2000, "Helo there world"),
        entry(2000, 3000, "Helo there world!"),
    ];
    assert!(token_set_ratio("helo there world", "helo there world!") > 90);

    let fixed = consolidator.consolidate(&raw);

    assert_eq!(timings(&fixed), vec![(1000, 3000, "Hello there world".to_string())]);
    assert_eq!(fixed[0].seq_num, 1);
}

/// A gap between fragments prevents merging
#[test]
fn test_consolidate_withGapBetweenFragments_shouldNotMerge() {
    let consolidator = Consolidator::default();
    let raw = vec![entry(1000, 2000, "Same text"), entry(2001, 3000, "Same text")];

    let fixed = consolidator.consolidate(&raw);

    assert_eq!(fixed.len(), 2);
    assert_eq!(fixed.iter().map(|e| e.seq_num).collect::<Vec<_>>(), vec![1, 2]);
}

/// Dissimilar adjacent cues stay separate and unmerged text is left alone
#[test]
fn test_consolidate_withDissimilarNeighbours_shouldKeepTextAsIs() {
    let consolidator = Consolidator::with_collaborators(
        ConsolidationConfig::default(),
        Arc::new(TokenSetMatcher),
        dictionary(),
    );
    let raw = vec![entry(0, 2000, "Helo there"), entry(2000, 4000, "General Kenobi")];

    let fixed = consolidator.consolidate(&raw);

    assert_eq!(
        timings(&fixed),
        vec![(0, 2000, "Helo there".to_string()), (2000, 4000, "General Kenobi".to_string())]
    );
}

/// With correct_unmerged every surviving cue is corrected
#[test]
fn test_consolidate_withCorrectUnmerged_shouldCorrectSingles() {
    let config = ConsolidationConfig { correct_unmerged: true, ..ConsolidationConfig::default() };
    let consolidator = Consolidator::with_collaborators(config, Arc::new(TokenSetMatcher), dictionary());

    let fixed = consolidator.consolidate(&[entry(0, 2000, "Helo there")]);

    assert_eq!(fixed[0].text, "Hello there");
}

/// The longest-fragment policy keeps the most complete text
#[test]
fn test_consolidate_withLongestPolicy_shouldKeepLongestFragment() {
    let raw = vec![
        entry(0, 1000, "see you later"),
        entry(1000, 2000, "see you later alligator"),
        entry(2000, 3000, "see you later"),
    ];
    let first = Consolidator::default().consolidate(&raw);
    let longest = Consolidator::new(ConsolidationConfig {
        fragment_policy: FragmentPolicy::Longest,
        ..ConsolidationConfig::default()
    })
    .consolidate(&raw);

    assert_eq!(timings(&first), vec![(0, 3000, "see you later".to_string())]);
    assert_eq!(timings(&longest), vec![(0, 3000, "see you later alligator".to_string())]);
}

/// Empty cues never survive
#[test]
fn test_consolidate_withEmptyText_shouldDrop() {
    let raw = vec![entry(0, 1000, "   "), entry(1000, 3000, "Real words")];

    let fixed = Consolidator::default().consolidate(&raw);

    assert_eq!(timings(&fixed), vec![(1000, 3000, "Real words".to_string())]);
}

/// Reading speed outside (1, 50) cps is dropped
#[test]
fn test_consolidate_withImplausibleSpeed_shouldDrop() {
    let too_fast = entry(0, 10, "ab");
    let fine = entry(1000, 2000, "0123456789");
    let too_slow = entry(5000, 15000, "a");

    assert_eq!(characters_per_second(&too_fast), Some(200));
    assert_eq!(characters_per_second(&fine), Some(10));
    assert_eq!(characters_per_second(&too_slow), Some(0));

    let fixed = Consolidator::default().consolidate(&[too_fast, fine, too_slow]);
    assert_eq!(timings(&fixed), vec![(1000, 2000, "0123456789".to_string())]);
}

/// Consolidating an already consolidated track changes nothing
#[test]
fn test_consolidate_withConsolidatedTrack_shouldBeIdempotent() {
    let raw = vec![
        entry(0, 1000, "Hello there"),
        entry(1000, 2000, "Hello there"),
        entry(2000, 3000, "Bye"),
        entry(4000, 4100, "way too fast for anyone"),
    ];
    let consolidator = Consolidator::default();

    let once = consolidator.consolidate(&raw);
    let twice = consolidator.consolidate(&once);

    assert_eq!(once, twice);
}

/// The dictionary corrector keeps punctuation and case
#[test]
fn test_dictionary_corrector_withMixedCase_shouldPreserveCase() {
    let corrector = dictionary();
    assert_eq!(corrector.correct("HELO, Wrld! general"), "HELLO, World! general");
}

/// Dictionary files accept optional frequencies and comments
#[test]
fn test_dictionary_corrector_parse_withFrequencies_shouldLoadWords() {
    let corrector = DictionaryCorrector::parse("# words\nhello 10\nhelp 3\n\nworld\n");

    assert_eq!(corrector.len(), 3);
    assert_eq!(corrector.correct("helo"), "hello");
}
