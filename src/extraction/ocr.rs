/*!
 * Text recognition collaborators.
 *
 * The segmenter only needs `recognize(image) -> text`. The default
 * implementation pipes a PNG to the `tesseract` command line tool.
 */

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::ImageFormat;
use log::{debug, warn};

use crate::app_config::OcrConfig;
use crate::errors::RecognitionError;
use crate::extraction::frame::ProcessedImage;

/// Recognizes the text shown in a processed band image
pub trait TextRecognizer: Send + Sync {
    /// Recognized text, or an empty string when nothing was found
    fn recognize(&self, image: &ProcessedImage) -> Result<String, RecognitionError>;
}

/// Run `recognizer`, mapping any failure to an empty result
pub fn recognize_or_empty(recognizer: &dyn TextRecognizer, image: &ProcessedImage) -> String {
    match recognizer.recognize(image) {
        Ok(text) => text,
        Err(e) => {
            warn!("Recognition failed, treating frame as blank: {}", e);
            String::new()
        }
    }
}

/// Join recognized lines into a single space-separated caption
pub fn join_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Recognizer backed by the tesseract CLI
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: String,
    languages: Vec<String>,
    page_segmentation_mode: u8,
}

impl TesseractRecognizer {
    pub fn new(command: impl Into<String>, languages: Vec<String>, page_segmentation_mode: u8) -> Self {
        Self {
            command: command.into(),
            languages,
            page_segmentation_mode,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.languages.clone(),
            config.page_segmentation_mode,
        )
    }

    fn encode_png(image: &ProcessedImage) -> Result<Vec<u8>, RecognitionError> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| RecognitionError::Encode(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &ProcessedImage) -> Result<String, RecognitionError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(String::new());
        }

        let png = Self::encode_png(image)?;
        let launch_error = |e: std::io::Error| RecognitionError::Launch {
            command: self.command.clone(),
            message: e.to_string(),
        };

        let mut child = Command::new(&self.command)
            .args([
                "stdin",
                "stdout",
                "-l",
                &self.languages.join("+"),
                "--psm",
                &self.page_segmentation_mode.to_string(),
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).map_err(launch_error)?;
            // stdin is dropped here so tesseract sees EOF
        }

        let output = child.wait_with_output().map_err(launch_error)?;
        if !output.status.success() {
            return Err(RecognitionError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = join_lines(&String::from_utf8_lossy(&output.stdout));
        debug!("Recognized {:?}", text);
        Ok(text)
    }
}
