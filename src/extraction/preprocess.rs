/*!
 * Band cropping and channel-average preprocessing.
 *
 * Each band is reduced to one gray channel by averaging six views of the same
 * pixels: red, green, blue, HSV saturation, HSV value and luminance. Colored
 * backgrounds contribute unevenly to those views, while the bright/dark
 * contrast of caption glyphs survives in all of them.
 */

use image::{GrayImage, Luma, RgbImage, imageops};

use crate::extraction::frame::{Band, ProcessedImage};

/// Number of channel views averaged per pixel
const CHANNEL_COUNT: f32 = 6.0;

/// Crop the rows of `frame` that belong to `band`
pub fn crop_band(frame: &RgbImage, band: Band) -> RgbImage {
    let (first_row, rows) = band.row_span(frame.height());
    imageops::crop_imm(frame, 0, first_row, frame.width(), rows).to_image()
}

/// Crop `frame` to `band` and build its processed gray image
pub fn process_band(frame: &RgbImage, band: Band) -> ProcessedImage {
    channel_average(&crop_band(frame, band))
}

/// Average the six channel views of an RGB image into one gray image
pub fn channel_average(image: &RgbImage) -> ProcessedImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Luma([pixel_average(r, g, b)])
    })
}

fn pixel_average(r: u8, g: u8, b: u8) -> u8 {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;

    let value = r.max(g).max(b);
    let min = r.min(g).min(b);
    let saturation = if value > 0.0 { (value - min) / value } else { 0.0 };
    let luminance = 0.299 * r + 0.587 * g + 0.114 * b;

    let mean = (r + g + b + saturation + value + luminance) / CHANNEL_COUNT;
    // Truncation, not rounding
    (mean * 255.0).clamp(0.0, 255.0) as u8
}
