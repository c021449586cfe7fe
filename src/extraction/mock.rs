/*!
 * Mock collaborators for testing the extraction pipeline without video files
 * or an OCR engine.
 *
 * Synthetic captions are drawn as one-in-four bright columns whose phase
 * encodes a caption id in `0..4`. Different ids never share a bright column,
 * so the frame comparator scores them as dissimilar, and `MockRecognizer::captions()`
 * can read the id back from any processed band image.
 */

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};

use crate::errors::{ExtractionError, RecognitionError};
use crate::extraction::frame::{Band, ProcessedImage, VideoFrame};
use crate::extraction::ocr::TextRecognizer;
use crate::extraction::video::{FrameSource, frame_timestamp};

/// Number of distinct synthetic captions
pub const CAPTION_IDS: u8 = 4;

/// Draw a frame showing caption `top` in the top band and `bottom` in the bottom band
pub fn caption_frame(width: u32, height: u32, top: Option<u8>, bottom: Option<u8>) -> RgbImage {
    let mut image = RgbImage::new(width, height);
    for (band, caption) in [(Band::Top, top), (Band::Bottom, bottom)] {
        let Some(id) = caption else { continue };
        let (first_row, rows) = band.row_span(height);
        for y in first_row..first_row + rows {
            for x in 0..width {
                if (x + u32::from(id % CAPTION_IDS)) % u32::from(CAPTION_IDS) == 0 {
                    image.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
        }
    }
    image
}

/// Text the caption recognizer reports for caption `id`
pub fn caption_text(id: u8) -> String {
    format!("CAPTION {}", id % CAPTION_IDS)
}

/// In-memory frame source
#[derive(Debug)]
pub struct MockFrameSource {
    frame_rate: f64,
    frame_count: u64,
    frames: VecDeque<VideoFrame>,
    // @field: Index at which the source reports an unreadable frame
    fail_at: Option<u64>,
}

impl MockFrameSource {
    pub fn new(frame_rate: f64, images: Vec<RgbImage>) -> Self {
        let frames: VecDeque<VideoFrame> = images
            .into_iter()
            .enumerate()
            .map(|(i, image)| {
                let index = i as u64;
                VideoFrame::new(index, frame_timestamp(index, frame_rate), image)
            })
            .collect();

        Self {
            frame_rate,
            frame_count: frames.len() as u64,
            frames,
            fail_at: None,
        }
    }

    /// Frames built from `(top, bottom)` caption ids
    pub fn from_captions(frame_rate: f64, width: u32, height: u32, captions: &[(Option<u8>, Option<u8>)]) -> Self {
        let images = captions
            .iter()
            .map(|(top, bottom)| caption_frame(width, height, *top, *bottom))
            .collect();
        Self::new(frame_rate, images)
    }

    /// Report a decoder error when frame `index` is requested
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl FrameSource for MockFrameSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, ExtractionError> {
        if let (Some(fail_at), Some(frame)) = (self.fail_at, self.frames.front()) {
            if frame.index == fail_at {
                return Err(ExtractionError::Decoder(format!("mock failure at frame {}", fail_at)));
            }
        }
        Ok(self.frames.pop_front())
    }
}

/// Behavior mode for the mock recognizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Read synthetic caption ids back from the image
    Captions,
    /// Always return the same text
    Fixed(&'static str),
    /// Always fail
    Failing,
}

/// Mock text recognizer
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    behavior: MockBehavior,
    // @field: Number of recognize calls, shared between clones
    calls: Arc<AtomicUsize>,
}

impl MockRecognizer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Recognizer for frames drawn by `caption_frame`
    pub fn captions() -> Self {
        Self::new(MockBehavior::Captions)
    }

    pub fn fixed(text: &'static str) -> Self {
        Self::new(MockBehavior::Fixed(text))
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn read_caption(image: &ProcessedImage) -> String {
        if image.height() == 0 {
            return String::new();
        }
        let first_bright = (0..image.width()).find(|x| image.get_pixel(*x, 0).0[0] > 0);
        match first_bright {
            Some(x) => {
                let ids = u32::from(CAPTION_IDS);
                caption_text(((ids - x % ids) % ids) as u8)
            }
            None => String::new(),
        }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, image: &ProcessedImage) -> Result<String, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Captions => Ok(Self::read_caption(image)),
            MockBehavior::Fixed(text) => Ok(text.to_string()),
            MockBehavior::Failing => Err(RecognitionError::Failed {
                status: 1,
                stderr: "mock recognizer failure".to_string(),
            }),
        }
    }
}
