/*!
 * Frame-level data types shared by the extraction stages.
 */

use std::fmt;
use std::time::Duration;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Single-channel 8-bit raster produced by the preprocessor
pub type ProcessedImage = GrayImage;

/// Horizontal region of the frame sampled for subtitle text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Upper quarter of the frame
    Top,
    /// Lower quarter of the frame
    Bottom,
}

impl Band {
    /// Both bands, in merge order
    pub const ALL: [Band; 2] = [Band::Top, Band::Bottom];

    /// Row range `(first_row, row_count)` this band covers in a frame of the given height
    pub fn row_span(&self, frame_height: u32) -> (u32, u32) {
        let height = f64::from(frame_height);
        match self {
            Band::Top => (0, (height / 4.0) as u32),
            Band::Bottom => {
                let first = (height / 4.0 * 3.0) as u32;
                (first, frame_height - first)
            }
        }
    }

    /// Suffix used for per-band output files
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Band::Top => "top",
            Band::Bottom => "bot",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Top => write!(f, "top"),
            Band::Bottom => write!(f, "bottom"),
        }
    }
}

/// Decoded video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Zero-based frame index in the stream
    pub index: u64,
    /// Presentation time since video start
    pub timestamp: Duration,
    /// RGB raster of the full frame
    pub image: RgbImage,
}

impl VideoFrame {
    pub fn new(index: u64, timestamp: Duration, image: RgbImage) -> Self {
        Self { index, timestamp, image }
    }
}

/// One band of one sampled frame after preprocessing and recognition
#[derive(Debug, Clone)]
pub struct FrameSample {
    pub index: u64,
    pub timestamp: Duration,
    pub band: Band,
    pub image: ProcessedImage,
    pub text: String,
}

impl FrameSample {
    /// Whether recognition found any text in this band
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Truncate a duration to whole milliseconds
pub fn duration_to_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
