use std::fs;
use std::fs::File;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use log::{warn, debug};

use crate::errors::SubtitleError;
use crate::extraction::frame::Band;

// @module: SubRip subtitle model, parsing and serialization

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}:\d{2}:\d{2},\d{3})\s*-->\s*(\d{2,}:\d{2}:\d{2},\d{3})").unwrap()
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry without validation
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// An entry may appear in a final track only with text and a positive duration
    pub fn is_valid(&self) -> bool {
        self.start_time_ms < self.end_time_ms && !self.text.trim().is_empty()
    }

    /// Duration in milliseconds, zero for inverted ranges
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Number of characters in the text, not counting spaces
    pub fn non_space_chars(&self) -> usize {
        self.text.chars().filter(|c| *c != ' ').count()
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let invalid = || SubtitleError::InvalidTimestamp(timestamp.to_string());
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(invalid());
        }

        let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
        let minutes: u64 = parts[1].parse().map_err(|_| invalid())?;
        let seconds: u64 = parts[2].parse().map_err(|_| invalid())?;
        let millis: u64 = parts[3].parse().map_err(|_| invalid())?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(invalid());
        }

        // Hours are unbounded in the text, so the sum must not wrap
        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .ok_or_else(invalid)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Collection of subtitle entries with metadata
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// File the entries were read from or will be written to
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,

    /// Band the entries were recognized in, `None` for a merged document
    pub band: Option<Band>,
}

impl SubtitleCollection {
    /// Create a new, empty subtitle collection
    pub fn new(source_file: PathBuf, band: Option<Band>) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            band,
        }
    }

    /// Create a collection around existing entries
    pub fn from_entries(source_file: PathBuf, band: Option<Band>, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            source_file,
            entries,
            band,
        }
    }

    /// Load and parse an SRT file
    pub fn read_from_srt<P: AsRef<Path>>(path: P, band: Option<Band>) -> Result<Self> {
        let path = path.as_ref();
        let entries = Self::parse_srt_file(path)?;
        debug!("Loaded {} entries from {}", entries.len(), path.display());
        Ok(Self::from_entries(path.to_path_buf(), band, entries))
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        for entry in &self.entries {
            write!(writer, "{}", entry)
                .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;
        }
        writer.flush()
            .with_context(|| format!("Failed to flush subtitle file: {}", path.display()))?;

        Ok(())
    }

    /// Render the whole collection as SRT text
    pub fn to_srt_string(&self) -> String {
        self.entries.iter().map(|entry| entry.to_string()).collect()
    }

    /// Parse SRT file content to subtitle entries
    fn parse_srt_file(path: &Path) -> Result<Vec<SubtitleEntry>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        Self::parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))
    }

    /// Parse SRT format string into subtitle entries
    ///
    /// Entries keep their file order and original sequence numbers. Entries
    /// with empty text are kept, since raw band timelines may contain them and
    /// the consolidator is responsible for dropping them. Empty input yields an
    /// empty list.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>> {
        let mut entries = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_times: Option<(u64, u64)> = None;
        let mut current_text = String::new();
        let mut saw_content = false;

        let mut finish_entry = |seq_num: usize, (start_ms, end_ms): (u64, u64), text: &str| {
            if end_ms <= start_ms {
                warn!("Subtitle entry {} has an invalid time range", seq_num);
            }
            entries.push(SubtitleEntry::new(seq_num, start_ms, end_ms, text.to_string()));
        };

        for (line_idx, line) in content.lines().enumerate() {
            let trimmed = line.trim().trim_start_matches('\u{feff}');

            if trimmed.is_empty() {
                // A blank line closes a block once its timestamp line has been seen
                if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
                    finish_entry(seq_num, times, &current_text);
                    current_seq_num = None;
                    current_times = None;
                    current_text.clear();
                }
                continue;
            }
            saw_content = true;

            if current_seq_num.is_none() {
                match trimmed.parse::<usize>() {
                    Ok(num) => current_seq_num = Some(num),
                    Err(_) => warn!("Unexpected text at line {} before sequence number: {}", line_idx + 1, trimmed),
                }
                continue;
            }

            if current_times.is_none() {
                match TIMESTAMP_REGEX.captures(trimmed) {
                    Some(caps) => {
                        let parse = |idx: usize| {
                            SubtitleEntry::parse_timestamp(&caps[idx]).map_err(|e| SubtitleError::Malformed {
                                line: line_idx + 1,
                                message: e.to_string(),
                            })
                        };
                        current_times = Some((parse(1)?, parse(2)?));
                    }
                    None => {
                        warn!("Invalid timestamp format at line {}: {}", line_idx + 1, trimmed);
                        current_seq_num = None;
                    }
                }
                continue;
            }

            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(trimmed);
        }

        // Add the last entry if the file lacks a trailing blank line
        if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
            finish_entry(seq_num, times, &current_text);
        }

        if entries.is_empty() && saw_content {
            return Err(SubtitleError::Malformed {
                line: 1,
                message: "no subtitle blocks found".to_string(),
            }.into());
        }

        let overlap_count = entries
            .windows(2)
            .filter(|pair| pair[0].end_time_ms > pair[1].start_time_ms)
            .count();
        if overlap_count > 0 {
            debug!("Found {} overlapping subtitle entries", overlap_count);
        }

        Ok(entries)
    }
}

/// Renumber entries sequentially starting at 1
pub fn renumber_entries(entries: &mut [SubtitleEntry]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.seq_num = i + 1;
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        match self.band {
            Some(band) => writeln!(f, "Band: {}", band)?,
            None => writeln!(f, "Band: merged")?,
        }
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
