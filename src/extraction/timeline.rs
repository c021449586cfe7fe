/*!
 * Streaming SubRip writer for one band.
 *
 * Cue headers are written as soon as a cue opens and completed when it
 * closes, so a long extraction leaves a readable partial file behind.
 */

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::errors::TimelineError;
use crate::extraction::frame::duration_to_ms;
use crate::extraction::segmenter::CueEvent;
use crate::subtitle_processor::SubtitleEntry;

/// Incremental SubRip writer
pub struct TimelineWriter<W: Write> {
    // @field: Output sink
    sink: W,

    // @field: Index of the cue whose header is written but not yet closed
    open_index: Option<usize>,

    // @field: Cues fully written
    written: usize,
}

impl TimelineWriter<BufWriter<File>> {
    /// Create (or truncate) a timeline file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, TimelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TimelineWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            open_index: None,
            written: 0,
        }
    }

    /// Number of cues completed so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn has_open_cue(&self) -> bool {
        self.open_index.is_some()
    }

    /// Write one segmenter event
    pub fn apply(&mut self, event: &CueEvent) -> Result<(), TimelineError> {
        match event {
            CueEvent::Opened { index, start } => self.cue_opened(*index, *start),
            CueEvent::Closed(entry) => self.cue_closed(entry),
        }
    }

    /// Write the header of a new cue up to the arrow
    ///
    /// An unterminated previous cue is a caller error and reported as dangling.
    pub fn cue_opened(&mut self, index: usize, start: Duration) -> Result<(), TimelineError> {
        if let Some(open) = self.open_index {
            return Err(TimelineError::DanglingCue { index: open });
        }
        write!(
            self.sink,
            "{}\n{} --> ",
            index,
            SubtitleEntry::format_timestamp(duration_to_ms(start))
        )?;
        self.open_index = Some(index);
        Ok(())
    }

    /// Complete the open cue with its end time and text
    pub fn cue_closed(&mut self, entry: &SubtitleEntry) -> Result<(), TimelineError> {
        if self.open_index.take().is_none() {
            return Err(TimelineError::NoOpenCue { end_ms: entry.end_time_ms });
        }
        write!(self.sink, "{}\n{}\n\n", entry.format_end_time(), entry.text)?;
        self.written += 1;
        Ok(())
    }

    /// Flush and return the sink; fails if a cue is still open
    pub fn finish(mut self) -> Result<W, TimelineError> {
        self.sink.flush()?;
        if let Some(index) = self.open_index {
            return Err(TimelineError::DanglingCue { index });
        }
        Ok(self.sink)
    }
}
