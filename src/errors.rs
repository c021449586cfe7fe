/*!
 * Error types for the unembedder application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when parsing or formatting subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A timestamp did not follow the HH:MM:SS,mmm layout
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A block could not be interpreted as a subtitle entry
    #[error("Malformed subtitle at line {line}: {message}")]
    Malformed {
        /// 1-based line number in the source text
        line: usize,
        /// What was wrong with the block
        message: String,
    },
}

/// Errors raised while reading frames from a video
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The stream properties of the video could not be read
    #[error("Failed to read stream info of video {path}: {message}")]
    StreamInfo {
        /// Video being inspected
        path: String,
        /// Reason reported by ffprobe
        message: String,
    },

    /// The decoder process could not be started or died unexpectedly
    #[error("Frame decoder error: {0}")]
    Decoder(String),

    /// Low level I/O failure while reading frames
    #[error("I/O error while reading frames: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a text recognizer
///
/// The segmentation core never propagates these; a failed recognition is
/// treated as an empty result.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The recognizer process could not be launched
    #[error("Failed to launch recognizer '{command}': {message}")]
    Launch {
        /// Command that was executed
        command: String,
        /// Underlying failure
        message: String,
    },

    /// The recognizer ran but reported a failure
    #[error("Recognizer exited with status {status}: {stderr}")]
    Failed {
        /// Exit status code, -1 when killed by a signal
        status: i32,
        /// Captured standard error
        stderr: String,
    },

    /// The image could not be encoded for the recognizer
    #[error("Failed to encode image for recognition: {0}")]
    Encode(String),
}

/// Errors raised by the streaming timeline writer
#[derive(Error, Debug)]
pub enum TimelineError {
    /// The stream ended while a cue header was written but never closed
    #[error("Timeline finished with cue {index} still open")]
    DanglingCue {
        /// Index of the unterminated entry
        index: usize,
    },

    /// A cue was closed although none was open
    #[error("Cue closed at {end_ms}ms but no cue was open")]
    NoOpenCue {
        /// End time of the offending close event
        end_ms: u64,
    },

    /// Writing to the underlying sink failed
    #[error("Failed to write timeline: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error while extracting frames
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error while writing a band timeline
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
