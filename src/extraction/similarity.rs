/*!
 * Image similarity used to decide whether a caption persists between frames.
 */

use crate::extraction::frame::ProcessedImage;

/// Compares two processed band images
pub trait FrameComparator: Send + Sync {
    /// Similarity in `[0, 1]`, where 1.0 means identical
    fn similarity(&self, previous: &ProcessedImage, current: &ProcessedImage) -> f32;
}

/// Full-image normalized cross-correlation
///
/// `sum(a * b) / sqrt(sum(a^2) * sum(b^2))`, the single-position case of a
/// normalized template match. Images of different sizes score 0.0; two
/// all-black images are considered identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedCrossCorrelation;

impl FrameComparator for NormalizedCrossCorrelation {
    fn similarity(&self, previous: &ProcessedImage, current: &ProcessedImage) -> f32 {
        if previous.dimensions() != current.dimensions() {
            return 0.0;
        }

        let (mut cross, mut energy_a, mut energy_b) = (0.0f64, 0.0f64, 0.0f64);
        for (a, b) in previous.as_raw().iter().zip(current.as_raw()) {
            let a = f64::from(*a);
            let b = f64::from(*b);
            cross += a * b;
            energy_a += a * a;
            energy_b += b * b;
        }

        if energy_a == 0.0 && energy_b == 0.0 {
            return 1.0;
        }
        let denominator = (energy_a * energy_b).sqrt();
        if denominator == 0.0 {
            return 0.0;
        }

        (cross / denominator).clamp(0.0, 1.0) as f32
    }
}
