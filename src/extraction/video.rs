/*!
 * Video frame sources.
 *
 * The extraction pipeline reads frames sequentially through `FrameSource`.
 * `FfmpegFrameSource` inspects the video with `ffprobe` and streams raw RGB
 * frames out of an `ffmpeg` child process.
 */

use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::Duration;

use image::RgbImage;
use log::{debug, warn};
use serde_json::Value;

use crate::errors::ExtractionError;
use crate::extraction::frame::VideoFrame;

/// Sequential access to decoded frames
pub trait FrameSource {
    /// Frames per second
    fn frame_rate(&self) -> f64;

    /// Total number of frames, used only to bound iteration
    fn frame_count(&self) -> u64;

    /// Next frame, or `None` at end of stream or on an unreadable frame
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, ExtractionError>;

    /// Duration of a single frame
    fn frame_period(&self) -> Duration {
        let fps = self.frame_rate();
        if fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        }
    }
}

/// Timestamp of frame `index` at `fps`, truncated to whole milliseconds
pub fn frame_timestamp(index: u64, fps: f64) -> Duration {
    if fps <= 0.0 {
        return Duration::ZERO;
    }
    let ms = (index as f64 * 1000.0 / fps).floor() as u64;
    Duration::from_millis(ms)
}

/// Stream properties reported by ffprobe
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub frame_count: u64,
}

impl StreamInfo {
    /// Run ffprobe on `path`
    pub fn inspect(path: &Path) -> Result<Self, ExtractionError> {
        let output = Command::new("ffprobe")
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_streams",
                "-select_streams", "v:0",
            ])
            .arg(path)
            .output()
            .map_err(|e| ExtractionError::StreamInfo {
                path: path.display().to_string(),
                message: format!("failed to execute ffprobe: {}", e),
            })?;

        if !output.status.success() {
            return Err(ExtractionError::StreamInfo {
                path: path.display().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::from_json(&String::from_utf8_lossy(&output.stdout)).map_err(|message| ExtractionError::StreamInfo {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse the JSON printed by `ffprobe -show_streams`
    pub fn from_json(json: &str) -> Result<Self, String> {
        let json: Value = serde_json::from_str(json).map_err(|e| format!("invalid ffprobe output: {}", e))?;
        let stream = json
            .get("streams")
            .and_then(|s| s.as_array())
            .and_then(|s| s.first())
            .ok_or_else(|| "no video stream found".to_string())?;

        let dimension = |key: &str| -> Result<u32, String> {
            stream
                .get(key)
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| format!("missing {}", key))
        };
        let width = dimension("width")?;
        let height = dimension("height")?;

        let frame_rate = ["r_frame_rate", "avg_frame_rate"]
            .iter()
            .filter_map(|key| stream.get(*key).and_then(|v| v.as_str()))
            .filter_map(parse_rational)
            .find(|fps| *fps > 0.0)
            .ok_or_else(|| "missing frame rate".to_string())?;

        let frame_count = match Self::string_field(stream, "nb_frames").and_then(|s| s.parse::<u64>().ok()) {
            Some(count) => count,
            None => {
                let duration = Self::string_field(stream, "duration")
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(|| "missing frame count and duration".to_string())?;
                (duration * frame_rate).floor() as u64
            }
        };

        Ok(Self { width, height, frame_rate, frame_count })
    }

    fn string_field<'a>(stream: &'a Value, key: &str) -> Option<&'a str> {
        stream.get(key).and_then(|v| v.as_str())
    }
}

/// Parse an ffprobe rational such as `30000/1001`
fn parse_rational(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => value.trim().parse().ok(),
    }
}

/// Frame source that decodes through an `ffmpeg` child process
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: StreamInfo,
    child: Child,
    reader: BufReader<ChildStdout>,
    next_index: u64,
    finished: bool,
}

impl FfmpegFrameSource {
    /// Inspect `path` and start decoding it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ExtractionError::StreamInfo {
                path: path.display().to_string(),
                message: "file does not exist".to_string(),
            });
        }

        let info = StreamInfo::inspect(path)?;
        debug!(
            "{}: {}x{} at {:.3} fps, {} frames",
            path.display(), info.width, info.height, info.frame_rate, info.frame_count
        );

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ExtractionError::Decoder(format!("failed to execute ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractionError::Decoder("ffmpeg stdout unavailable".to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child,
            reader: BufReader::new(stdout),
            next_index: 0,
            finished: false,
        })
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.info
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_rate(&self) -> f64 {
        self.info.frame_rate
    }

    fn frame_count(&self) -> u64 {
        self.info.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, ExtractionError> {
        if self.finished || self.next_index >= self.info.frame_count {
            return Ok(None);
        }

        let frame_bytes = self.info.width as usize * self.info.height as usize * 3;
        let mut buffer = vec![0u8; frame_bytes];
        match self.reader.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!("{}: stream ended at frame {}", self.path.display(), self.next_index);
                self.finished = true;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let Some(image) = RgbImage::from_raw(self.info.width, self.info.height, buffer) else {
            warn!("{}: unreadable frame {}", self.path.display(), self.next_index);
            self.finished = true;
            return Ok(None);
        };

        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(VideoFrame::new(index, frame_timestamp(index, self.info.frame_rate), image)))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        // Stop decoding early when the consumer gives up before EOF
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
