/*!
 * Post-processing of extracted band tracks.
 *
 * - `fixer`: Merges fragmented cues and filters implausible ones
 * - `merger`: Combines the top and bottom tracks into one document
 * - `fuzzy`: Token-set text similarity
 * - `spelling`: Spell correction of merged cues
 */

// Re-export main types for easier usage
pub use self::fixer::{ConsolidationConfig, Consolidator, FragmentPolicy, characters_per_second};
pub use self::fuzzy::{TextSimilarity, TokenSetMatcher};
pub use self::merger::{MergePolicy, TrackMerger};
pub use self::spelling::{DictionaryCorrector, IdentityCorrector, SpellCorrector};

// Submodules
pub mod fixer;
pub mod fuzzy;
pub mod merger;
pub mod spelling;
