/*!
 * Per-video extraction driver.
 *
 * Reads frames in order, preprocesses and recognizes both bands, advances one
 * `BandSegmenter` per band and streams every cue event to that band's
 * `TimelineWriter`.
 */

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::app_config::ExtractionConfig;
use crate::errors::AppError;
use crate::extraction::frame::{Band, FrameSample, VideoFrame};
use crate::extraction::ocr::{TextRecognizer, recognize_or_empty};
use crate::extraction::preprocess::process_band;
use crate::extraction::segmenter::{BandSegmenter, CueEvent};
use crate::extraction::similarity::{FrameComparator, NormalizedCrossCorrelation};
use crate::extraction::timeline::TimelineWriter;
use crate::extraction::video::FrameSource;
use crate::subtitle_processor::SubtitleEntry;

/// Result of extracting one video
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Cues of the top band, in emission order
    pub top: Vec<SubtitleEntry>,
    /// Cues of the bottom band, in emission order
    pub bottom: Vec<SubtitleEntry>,
    /// Frames read from the source
    pub frames_read: u64,
    /// Frames actually sampled after applying the frame step
    pub frames_processed: u64,
}

impl ExtractionOutcome {
    pub fn entries(&self, band: Band) -> &[SubtitleEntry] {
        match band {
            Band::Top => &self.top,
            Band::Bottom => &self.bottom,
        }
    }
}

/// One band's segmenter together with its output
struct BandTrack<W: Write> {
    segmenter: BandSegmenter,
    writer: TimelineWriter<W>,
    entries: Vec<SubtitleEntry>,
}

impl<W: Write> BandTrack<W> {
    fn new(band: Band, threshold: f32, writer: TimelineWriter<W>) -> Self {
        Self {
            segmenter: BandSegmenter::with_threshold(band, threshold),
            writer,
            entries: Vec::new(),
        }
    }

    fn emit(&mut self, events: Vec<CueEvent>) -> Result<(), AppError> {
        for event in events {
            self.writer.apply(&event)?;
            if let CueEvent::Closed(entry) = event {
                self.entries.push(entry);
            }
        }
        Ok(())
    }
}

/// Drives segmentation of a whole video
pub struct VideoExtractor {
    config: ExtractionConfig,
    comparator: Arc<dyn FrameComparator>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl VideoExtractor {
    pub fn new(config: ExtractionConfig, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self::with_comparator(config, recognizer, Arc::new(NormalizedCrossCorrelation))
    }

    pub fn with_comparator(
        config: ExtractionConfig,
        recognizer: Arc<dyn TextRecognizer>,
        comparator: Arc<dyn FrameComparator>,
    ) -> Self {
        Self {
            config,
            comparator,
            recognizer,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract both bands of `source` into the given writers
    ///
    /// `progress` is called after every frame read with `(frames_read, frame_count)`.
    pub fn extract<S, W>(
        &self,
        source: &mut S,
        top: TimelineWriter<W>,
        bottom: TimelineWriter<W>,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<ExtractionOutcome, AppError>
    where
        S: FrameSource + ?Sized,
        W: Write,
    {
        let threshold = self.config.similarity_threshold;
        let step = self.config.frame_step.max(1);
        let total = source.frame_count();
        let mut tracks = [
            BandTrack::new(Band::Top, threshold, top),
            BandTrack::new(Band::Bottom, threshold, bottom),
        ];

        let mut frames_read = 0u64;
        let mut frames_processed = 0u64;
        while frames_read < total {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("Frame source ended after {} of {} frames", frames_read, total);
                    break;
                }
                Err(e) => {
                    // An unreadable frame ends the stream; open cues close at the last good frame
                    warn!("Stopping after {} of {} frames: {}", frames_read, total, e);
                    break;
                }
            };
            frames_read += 1;

            if frame.index % step == 0 {
                let (top_sample, bottom_sample) = self.observe(&frame);
                for (track, sample) in tracks.iter_mut().zip([top_sample, bottom_sample]) {
                    let events = track
                        .segmenter
                        .process(sample, self.comparator.as_ref(), self.recognizer.as_ref());
                    track.emit(events)?;
                }
                frames_processed += 1;
            }

            progress(frames_read, total);
        }

        let min_duration = sampling_period(source.frame_period(), step);
        let [mut top, mut bottom] = tracks;
        for track in [&mut top, &mut bottom] {
            let events = track.segmenter.finish(self.recognizer.as_ref(), min_duration);
            track.emit(events)?;
        }
        top.writer.finish()?;
        bottom.writer.finish()?;

        info!(
            "Extracted {} top and {} bottom cues from {} frames",
            top.entries.len(),
            bottom.entries.len(),
            frames_processed
        );

        Ok(ExtractionOutcome {
            top: top.entries,
            bottom: bottom.entries,
            frames_read,
            frames_processed,
        })
    }

    /// Extract `source` into two timeline files
    pub fn extract_to_files<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        top_path: &Path,
        bottom_path: &Path,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<ExtractionOutcome> {
        let top = TimelineWriter::create(top_path)
            .with_context(|| format!("Failed to create timeline file: {:?}", top_path))?;
        let bottom = TimelineWriter::create(bottom_path)
            .with_context(|| format!("Failed to create timeline file: {:?}", bottom_path))?;

        self.extract(source, top, bottom, progress).with_context(|| {
            format!(
                "Extraction aborted; partial timelines left at {:?} and {:?}",
                top_path, bottom_path
            )
        })
    }

    /// Preprocess and recognize both bands of one frame
    fn observe(&self, frame: &VideoFrame) -> (FrameSample, FrameSample) {
        let sample = |band: Band| {
            let image = process_band(&frame.image, band);
            let text = recognize_or_empty(self.recognizer.as_ref(), &image);
            FrameSample {
                index: frame.index,
                timestamp: frame.timestamp,
                band,
                image,
                text,
            }
        };

        if self.config.parallel_bands {
            rayon::join(|| sample(Band::Top), || sample(Band::Bottom))
        } else {
            (sample(Band::Top), sample(Band::Bottom))
        }
    }
}

/// Time covered by one sampled frame
fn sampling_period(frame_period: Duration, step: u64) -> Duration {
    frame_period * u32::try_from(step).unwrap_or(u32::MAX)
}
