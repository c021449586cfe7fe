/*!
 * # Unembedder - burned-in subtitle extraction
 *
 * A Rust library for recovering subtitles that are rendered into the video
 * picture itself.
 *
 * ## Features
 *
 * - Sample the top and bottom quarter of every frame
 * - Recognize caption text per frame and segment it into timed cues
 * - Average the frames of each cue to get a cleaner recognition target
 * - Merge fragmented cues and drop cues with implausible reading speed
 * - Join the top and bottom tracks into one SubRip document
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SubRip parsing and writing
 * - `extraction`: Frame pipeline producing one track per band:
 *   - `extraction::preprocess`: Band cropping and channel averaging
 *   - `extraction::segmenter`: Per-band cue state machine
 *   - `extraction::accumulator`: Frame averaging for open cues
 *   - `extraction::timeline`: Streaming SubRip writer
 *   - `extraction::video` / `extraction::ocr`: ffmpeg and tesseract collaborators
 * - `consolidation`: Track cleanup:
 *   - `consolidation::fixer`: Fragment merging and reading-speed filter
 *   - `consolidation::merger`: Top and bottom track merging
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod subtitle_processor;
pub mod extraction;
pub mod consolidation;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use extraction::{Band, BandSegmenter, VideoExtractor};
pub use consolidation::{Consolidator, TrackMerger};
pub use errors::{AppError, ExtractionError, RecognitionError, SubtitleError, TimelineError};
