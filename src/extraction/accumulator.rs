/*!
 * Running frame sum for an open cue and its representative average.
 */

use std::time::Duration;

use image::GrayImage;

use crate::extraction::frame::ProcessedImage;

/// Absorbs the error of the v / 255 * 255 round trip before truncation
const ROUNDING_SLACK: f64 = 1e-6;

/// Accumulator for one open cue
///
/// Holds the pixel-wise sum of every frame judged to show the same caption,
/// normalized to `[0, 1]`, so that the cue can be recognized once from the
/// temporal average instead of from each noisy frame.
#[derive(Debug, Clone)]
pub struct CueAccumulator {
    start: Duration,
    width: u32,
    height: u32,
    sum: Vec<f64>,
    count: u32,
    last_text: String,
}

impl CueAccumulator {
    /// Open a cue at `start`, seeded with its first frame
    pub fn new(start: Duration, image: &ProcessedImage, text: &str) -> Self {
        let sum = image.as_raw().iter().map(|v| f64::from(*v) / 255.0).collect();
        Self {
            start,
            width: image.width(),
            height: image.height(),
            sum,
            count: 1,
            last_text: text.to_string(),
        }
    }

    /// Add another frame of the same caption
    ///
    /// A frame whose size differs from the seed is ignored.
    pub fn add(&mut self, image: &ProcessedImage, text: &str) {
        if image.dimensions() != (self.width, self.height) {
            log::warn!(
                "Ignoring {}x{} frame in a {}x{} cue",
                image.width(), image.height(), self.width, self.height
            );
            return;
        }

        for (acc, value) in self.sum.iter_mut().zip(image.as_raw()) {
            *acc += f64::from(*value) / 255.0;
        }
        self.count += 1;
        self.last_text = text.to_string();
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    /// Number of frames accumulated, always at least 1
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Text recognized on the most recently added frame
    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Representative image of the cue
    pub fn average(&self) -> ProcessedImage {
        synthesize(&self.sum, self.count, self.width, self.height)
    }
}

/// Divide a normalized frame sum by its sample count and rescale to 8 bits
///
/// Values are truncated like the preprocessor does. A zero count is treated
/// as one.
pub fn synthesize(sum: &[f64], count: u32, width: u32, height: u32) -> ProcessedImage {
    let count = f64::from(count.max(1));
    let pixels = sum
        .iter()
        .map(|value| ((value / count) * 255.0 + ROUNDING_SLACK).clamp(0.0, 255.0) as u8)
        .collect();

    // The buffer always has width * height elements; fall back to black otherwise.
    GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| GrayImage::new(width, height))
}
