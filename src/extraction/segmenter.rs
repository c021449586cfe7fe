/*!
 * Per-band cue segmentation.
 *
 * A band is either `Idle` (no caption on screen) or `Open` (a caption is being
 * accumulated). Each sampled frame contributes whether text was recognized
 * and, while a cue is open, how similar the band looks to the previous frame:
 *
 * | state | observation            | action     | next |
 * |-------|------------------------|------------|------|
 * | Idle  | no text                | none       | Idle |
 * | Idle  | text                   | open       | Open |
 * | Open  | no text                | close      | Idle |
 * | Open  | text, similar          | accumulate | Open |
 * | Open  | text, not similar      | split      | Open |
 *
 * Closing a cue recognizes the average of all frames accumulated for it.
 */

use std::time::Duration;

use log::debug;

use crate::extraction::accumulator::CueAccumulator;
use crate::extraction::frame::{Band, FrameSample, ProcessedImage, duration_to_ms};
use crate::extraction::ocr::{TextRecognizer, recognize_or_empty};
use crate::extraction::similarity::FrameComparator;
use crate::subtitle_processor::SubtitleEntry;

/// Default similarity at or above which a caption is considered unchanged
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.9;

/// Segmenter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    Idle,
    Open,
}

/// What the segmenter does in response to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAction {
    /// Nothing happens
    None,
    /// Start a cue seeded with the current frame
    Open,
    /// Add the current frame to the open cue
    Accumulate,
    /// Close the open cue at the current timestamp
    Close,
    /// Close the open cue and immediately open a new one at the same timestamp
    Split,
}

/// Pure transition function
///
/// `similarity` is only consulted for an open cue with text present; a missing
/// score counts as the minimum similarity.
pub fn transition(
    state: SegmenterState,
    has_text: bool,
    similarity: Option<f32>,
    threshold: f32,
) -> (SegmenterState, SegmentAction) {
    match (state, has_text) {
        (SegmenterState::Idle, false) => (SegmenterState::Idle, SegmentAction::None),
        (SegmenterState::Idle, true) => (SegmenterState::Open, SegmentAction::Open),
        (SegmenterState::Open, false) => (SegmenterState::Idle, SegmentAction::Close),
        (SegmenterState::Open, true) => {
            if similarity.unwrap_or(0.0) >= threshold {
                (SegmenterState::Open, SegmentAction::Accumulate)
            } else {
                (SegmenterState::Open, SegmentAction::Split)
            }
        }
    }
}

/// Event emitted toward the timeline writer
#[derive(Debug, Clone, PartialEq)]
pub enum CueEvent {
    /// A cue started; its header can be written
    Opened { index: usize, start: Duration },
    /// A cue ended with its recognized text
    Closed(SubtitleEntry),
}

/// State machine for one band of one video
pub struct BandSegmenter {
    band: Band,
    threshold: f32,
    state: SegmenterState,
    cue: Option<CueAccumulator>,
    cue_index: usize,
    previous_image: Option<ProcessedImage>,
    last_timestamp: Option<Duration>,
    closed_count: usize,
}

impl BandSegmenter {
    pub fn new(band: Band) -> Self {
        Self::with_threshold(band, DEFAULT_SIMILARITY_THRESHOLD)
    }

    pub fn with_threshold(band: Band, threshold: f32) -> Self {
        Self {
            band,
            threshold,
            state: SegmenterState::Idle,
            cue: None,
            cue_index: 0,
            previous_image: None,
            last_timestamp: None,
            closed_count: 0,
        }
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Number of cues closed so far
    pub fn closed_count(&self) -> usize {
        self.closed_count
    }

    /// Feed one sampled frame of this band
    pub fn process(
        &mut self,
        sample: FrameSample,
        comparator: &dyn FrameComparator,
        recognizer: &dyn TextRecognizer,
    ) -> Vec<CueEvent> {
        let has_text = sample.has_text();
        let similarity = match (self.state, has_text, &self.previous_image) {
            (SegmenterState::Open, true, Some(previous)) => Some(comparator.similarity(previous, &sample.image)),
            _ => None,
        };

        // The first frame opens at the very start of the video
        let timestamp = if self.last_timestamp.is_none() { Duration::ZERO } else { sample.timestamp };

        let (next_state, action) = transition(self.state, has_text, similarity, self.threshold);
        if let Some(score) = similarity {
            debug!("[{}] frame {} similarity {:.4} -> {:?}", self.band, sample.index, score, action);
        }

        let mut events = Vec::new();
        match action {
            SegmentAction::None => {}
            SegmentAction::Open => {
                events.push(self.open_cue(timestamp, &sample));
            }
            SegmentAction::Accumulate => {
                if let Some(cue) = self.cue.as_mut() {
                    cue.add(&sample.image, &sample.text);
                }
            }
            SegmentAction::Close => {
                events.extend(self.close_cue(timestamp, recognizer));
            }
            SegmentAction::Split => {
                events.extend(self.close_cue(timestamp, recognizer));
                events.push(self.open_cue(timestamp, &sample));
            }
        }

        self.state = next_state;
        self.previous_image = Some(sample.image);
        self.last_timestamp = Some(timestamp);
        events
    }

    /// Close a cue left open at end of stream
    ///
    /// The cue ends at the last processed timestamp. A cue opened on that very
    /// frame is given `min_duration` so that its end stays after its start.
    pub fn finish(&mut self, recognizer: &dyn TextRecognizer, min_duration: Duration) -> Vec<CueEvent> {
        if self.state != SegmenterState::Open {
            return Vec::new();
        }

        let last = self.last_timestamp.unwrap_or(Duration::ZERO);
        let start = self.cue.as_ref().map(|cue| cue.start()).unwrap_or(last);
        let mut end = last;
        if end <= start {
            end = start + min_duration.max(Duration::from_millis(1));
        }

        self.state = SegmenterState::Idle;
        self.close_cue(end, recognizer).into_iter().collect()
    }

    fn open_cue(&mut self, start: Duration, sample: &FrameSample) -> CueEvent {
        self.cue_index += 1;
        self.cue = Some(CueAccumulator::new(start, &sample.image, &sample.text));
        debug!("[{}] cue {} opened at {:?}", self.band, self.cue_index, start);
        CueEvent::Opened { index: self.cue_index, start }
    }

    fn close_cue(&mut self, end: Duration, recognizer: &dyn TextRecognizer) -> Option<CueEvent> {
        let cue = self.cue.take()?;
        let text = recognize_or_empty(recognizer, &cue.average());
        self.closed_count += 1;
        debug!(
            "[{}] cue {} closed at {:?} after {} frames: {:?}",
            self.band, self.cue_index, end, cue.count(), text
        );

        Some(CueEvent::Closed(SubtitleEntry::new(
            self.cue_index,
            duration_to_ms(cue.start()),
            duration_to_ms(end),
            text,
        )))
    }
}
