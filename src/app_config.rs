use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::consolidation::{ConsolidationConfig, MergePolicy};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Frame sampling and segmentation
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Text recognition
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Per-band consolidation
    #[serde(default)]
    pub consolidation: ConsolidationConfig,

    /// How the two bands are joined
    #[serde(default)]
    pub merge_policy: MergePolicy,

    /// Spelling correction of merged cues
    #[serde(default)]
    pub spelling: SpellingConfig,

    /// Number of videos processed at once in folder mode
    #[serde(default = "default_concurrent_files")]
    pub concurrent_files: usize,

    /// Keep the raw and fixed per-band files next to the joined output
    #[serde(default = "default_true")]
    pub keep_intermediate: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Frame sampling and segmentation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    // @field: Similarity at or above which a caption is considered unchanged
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    // @field: Process every Nth frame
    #[serde(default = "default_frame_step")]
    pub frame_step: u64,

    // @field: Preprocess and recognize both bands concurrently
    #[serde(default = "default_true")]
    pub parallel_bands: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            frame_step: default_frame_step(),
            parallel_bands: true,
        }
    }
}

/// Tesseract settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OcrConfig {
    // @field: Executable name or path
    #[serde(default = "default_ocr_command")]
    pub command: String,

    // @field: Tesseract language codes, joined with '+'
    #[serde(default = "default_ocr_languages")]
    pub languages: Vec<String>,

    // @field: Tesseract --psm value
    #[serde(default = "default_page_segmentation_mode")]
    pub page_segmentation_mode: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: default_ocr_command(),
            languages: default_ocr_languages(),
            page_segmentation_mode: default_page_segmentation_mode(),
        }
    }
}

/// Spelling correction settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SpellingConfig {
    /// Word-frequency list; no correction when unset
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.9
}

fn default_frame_step() -> u64 {
    1
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_ocr_languages() -> Vec<String> {
    vec!["eng".to_string(), "spa".to_string()]
}

fn default_page_segmentation_mode() -> u8 {
    6 // single uniform block of text
}

fn default_concurrent_files() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load a configuration file, writing the defaults there first if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let threshold = self.extraction.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!("Similarity threshold must be between 0 and 1, got {}", threshold));
        }

        if self.extraction.frame_step == 0 {
            return Err(anyhow!("Frame step must be at least 1"));
        }

        if self.ocr.command.trim().is_empty() {
            return Err(anyhow!("OCR command must not be empty"));
        }

        if self.ocr.languages.is_empty() {
            return Err(anyhow!("At least one OCR language is required"));
        }

        if self.ocr.page_segmentation_mode > 13 {
            return Err(anyhow!(
                "Page segmentation mode must be between 0 and 13, got {}",
                self.ocr.page_segmentation_mode
            ));
        }

        if self.consolidation.merge_threshold > 100 {
            return Err(anyhow!(
                "Merge threshold must be between 0 and 100, got {}",
                self.consolidation.merge_threshold
            ));
        }

        if self.consolidation.min_cps >= self.consolidation.max_cps {
            return Err(anyhow!(
                "Minimum cps ({}) must be lower than maximum cps ({})",
                self.consolidation.min_cps,
                self.consolidation.max_cps
            ));
        }

        if self.concurrent_files == 0 {
            return Err(anyhow!("Concurrent files must be at least 1"));
        }

        if let Some(dictionary) = &self.spelling.dictionary_path {
            if !dictionary.is_file() {
                return Err(anyhow!("Dictionary file not found: {:?}", dictionary));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            extraction: ExtractionConfig::default(),
            ocr: OcrConfig::default(),
            consolidation: ConsolidationConfig::default(),
            merge_policy: MergePolicy::default(),
            spelling: SpellingConfig::default(),
            concurrent_files: default_concurrent_files(),
            keep_intermediate: true,
            log_level: LogLevel::default(),
        }
    }
}
