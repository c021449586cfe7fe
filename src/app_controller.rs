use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::consolidation::{
    Consolidator, DictionaryCorrector, IdentityCorrector, SpellCorrector, TextSimilarity,
    TokenSetMatcher, TrackMerger,
};
use crate::errors::ExtractionError;
use crate::extraction::{
    Band, ExtractionOutcome, FfmpegFrameSource, FrameSource, TesseractRecognizer, TextRecognizer,
    VideoExtractor,
};
use crate::file_utils::FileManager;
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};

// @module: Application controller for subtitle extraction

/// Opens a frame source for a video path
pub type FrameSourceFactory =
    Arc<dyn Fn(&Path) -> Result<Box<dyn FrameSource + Send>, ExtractionError> + Send + Sync>;

/// Files written for one processed video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoReport {
    /// Merged document
    pub joined_path: PathBuf,
    /// Raw cues per band as (top, bottom)
    pub raw_cues: (usize, usize),
    /// Consolidated cues per band as (top, bottom)
    pub fixed_cues: (usize, usize),
    /// Cues in the merged document
    pub merged_cues: usize,
    /// Frames sampled from the video
    pub frames_processed: u64,
}

/// Outcome of processing one video
#[derive(Debug, Clone, PartialEq)]
pub enum VideoOutcome {
    Processed(VideoReport),
    /// The joined output already existed
    Skipped(PathBuf),
}

/// Counts for a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for subtitle extraction
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Text recognizer shared by every video
    recognizer: Arc<dyn TextRecognizer>,

    // @field: Spell corrector used during consolidation
    corrector: Arc<dyn SpellCorrector>,

    // @field: Text similarity used during consolidation
    similarity: Arc<dyn TextSimilarity>,

    // @field: Opens videos for reading
    frame_sources: FrameSourceFactory,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let corrector: Arc<dyn SpellCorrector> = match &config.spelling.dictionary_path {
            Some(path) => Arc::new(DictionaryCorrector::from_file(path)?),
            None => Arc::new(IdentityCorrector),
        };
        let recognizer = Arc::new(TesseractRecognizer::from_config(&config.ocr));
        let frame_sources: FrameSourceFactory = Arc::new(|path: &Path| {
            FfmpegFrameSource::open(path).map(|source| Box::new(source) as Box<dyn FrameSource + Send>)
        });

        Ok(Self {
            config,
            recognizer,
            corrector,
            similarity: Arc::new(TokenSetMatcher),
            frame_sources,
        })
    }

    /// Replace the text recognizer
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Replace the spell corrector
    pub fn with_corrector(mut self, corrector: Arc<dyn SpellCorrector>) -> Self {
        self.corrector = corrector;
        self
    }

    /// Replace how videos are opened
    pub fn with_frame_source_factory(mut self, frame_sources: FrameSourceFactory) -> Self {
        self.frame_sources = frame_sources;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn consolidator(&self) -> Consolidator {
        Consolidator::with_collaborators(
            self.config.consolidation.clone(),
            Arc::clone(&self.similarity),
            Arc::clone(&self.corrector),
        )
    }

    fn merger(&self) -> TrackMerger {
        TrackMerger::new(self.config.merge_policy)
    }

    /// Run the main workflow with input video file and output directory
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<VideoOutcome> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, output_dir, &multi_progress, force_overwrite).await
    }

    /// Extract, consolidate and merge one video
    async fn run_with_progress(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<VideoOutcome> {
        let start_time = Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let joined_path = FileManager::joined_path(&input_file, &output_dir);
        if joined_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, output already exists (use -f to force overwrite)", joined_path);
            return Ok(VideoOutcome::Skipped(joined_path));
        }

        FileManager::ensure_dir(&output_dir)?;
        info!("Extracting subtitles from {:?}", input_file);

        let outcome = self.extract_video(&input_file, &output_dir, multi_progress).await?;
        let extraction_elapsed = start_time.elapsed();

        let consolidator = self.consolidator();
        let top = consolidator.consolidate(&outcome.top);
        let bottom = consolidator.consolidate(&outcome.bottom);
        for (band, entries) in [(Band::Top, &top), (Band::Bottom, &bottom)] {
            let path = FileManager::fixed_track_path(&input_file, &output_dir, band);
            SubtitleCollection::from_entries(input_file.clone(), Some(band), entries.clone())
                .write_to_srt(&path)?;
            debug!("Wrote {} consolidated {} cues to {:?}", entries.len(), band, path);
        }

        let merged = self.merger().merge(&top, &bottom);
        SubtitleCollection::from_entries(input_file.clone(), None, merged.clone())
            .write_to_srt(&joined_path)?;

        if !self.config.keep_intermediate {
            for band in Band::ALL {
                FileManager::remove_file(FileManager::band_track_path(&input_file, &output_dir, band))?;
                FileManager::remove_file(FileManager::fixed_track_path(&input_file, &output_dir, band))?;
            }
        }

        info!(
            "Success: {} ({} cues). Extraction: {} - Total: {}",
            joined_path.display(),
            merged.len(),
            Self::format_duration(extraction_elapsed),
            Self::format_duration(start_time.elapsed())
        );

        Ok(VideoOutcome::Processed(VideoReport {
            joined_path,
            raw_cues: (outcome.top.len(), outcome.bottom.len()),
            fixed_cues: (top.len(), bottom.len()),
            merged_cues: merged.len(),
            frames_processed: outcome.frames_processed,
        }))
    }

    /// Run the frame pipeline on a blocking thread with a progress bar
    async fn extract_video(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
    ) -> Result<ExtractionOutcome> {
        let top_path = FileManager::band_track_path(input_file, output_dir, Band::Top);
        let bottom_path = FileManager::band_track_path(input_file, output_dir, Band::Bottom);

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(Self::progress_style("frames"));
        progress_bar.set_message(
            input_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let extractor = VideoExtractor::new(self.config.extraction.clone(), Arc::clone(&self.recognizer));
        let frame_sources = Arc::clone(&self.frame_sources);
        let input = input_file.to_path_buf();
        let pb = progress_bar.clone();

        let result = tokio::task::spawn_blocking(move || -> Result<ExtractionOutcome> {
            let mut source = frame_sources(input.as_path())
                .with_context(|| format!("Failed to open video: {:?}", input))?;
            pb.set_length(source.frame_count());
            extractor.extract_to_files(source.as_mut(), &top_path, &bottom_path, &mut |done, _total| {
                pb.set_position(done);
            })
        })
        .await
        .context("Extraction task panicked")?;

        // Finish and clear so only the folder bar remains in batch mode
        progress_bar.finish_and_clear();
        result
    }

    /// Consolidate a single track file into `<stem>_fixed.srt` (or `output`)
    pub fn fix_file(&self, track_file: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
        let collection = SubtitleCollection::read_from_srt(track_file, None)?;
        let fixed = self.consolidator().consolidate(&collection.entries);

        let output_path = output.unwrap_or_else(|| FileManager::fixed_path_for(track_file));
        SubtitleCollection::from_entries(track_file.to_path_buf(), None, fixed.clone())
            .write_to_srt(&output_path)?;

        info!(
            "Success: {} ({} of {} cues kept)",
            output_path.display(),
            fixed.len(),
            collection.entries.len()
        );
        Ok(output_path)
    }

    /// Merge two track files into one document
    pub fn join_files(&self, top_file: &Path, bottom_file: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
        let top = Self::valid_entries(SubtitleCollection::read_from_srt(top_file, Some(Band::Top))?);
        let bottom = Self::valid_entries(SubtitleCollection::read_from_srt(bottom_file, Some(Band::Bottom))?);
        let merged = self.merger().merge(&top, &bottom);

        let output_path = output.unwrap_or_else(|| Self::joined_path_for(top_file));
        SubtitleCollection::from_entries(top_file.to_path_buf(), None, merged.clone())
            .write_to_srt(&output_path)?;

        info!("Success: {} ({} cues)", output_path.display(), merged.len());
        Ok(output_path)
    }

    /// Entries of a hand-supplied track that can appear in a joined document
    fn valid_entries(collection: SubtitleCollection) -> Vec<SubtitleEntry> {
        let total = collection.entries.len();
        let valid: Vec<SubtitleEntry> = collection.entries.into_iter().filter(|e| e.is_valid()).collect();
        if valid.len() < total {
            warn!(
                "Dropped {} empty or zero-length cues from {}",
                total - valid.len(),
                collection.source_file.display()
            );
        }
        valid
    }

    /// `<video>_joined.srt` next to a `<video>_top[_fixed].srt` track
    pub fn joined_path_for(top_file: &Path) -> PathBuf {
        let stem = top_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let top_suffix = format!("_{}", Band::Top.file_suffix());
        let mut video_stem = stem.as_str();
        video_stem = video_stem.strip_suffix("_fixed").unwrap_or(video_stem);
        video_stem = video_stem.strip_suffix(top_suffix.as_str()).unwrap_or(video_stem);

        let output_dir = top_file.parent().unwrap_or(Path::new(""));
        output_dir.join(format!("{}_joined.srt", video_stem))
    }

    /// Run the workflow in folder mode, processing all video files in a directory
    /// Videos that already have a joined output are skipped
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: Option<PathBuf>, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let video_files = FileManager::find_videos(&input_dir)?;
        if video_files.is_empty() {
            return Err(anyhow!("No video files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(video_files.len() as u64));
        folder_pb.set_style(Self::progress_style("files"));
        folder_pb.set_message("Processing files");

        let outcomes: Vec<(PathBuf, Result<VideoOutcome>)> = stream::iter(video_files)
            .map(|video_file| {
                let target_dir = output_dir
                    .clone()
                    .or_else(|| video_file.parent().map(Path::to_path_buf))
                    .unwrap_or_else(|| input_dir.clone());
                let multi_progress = &multi_progress;
                let folder_pb = &folder_pb;
                async move {
                    let result = self
                        .run_with_progress(video_file.clone(), target_dir, multi_progress, force_overwrite)
                        .await;
                    folder_pb.inc(1);
                    (video_file, result)
                }
            })
            .buffer_unordered(self.config.concurrent_files.max(1))
            .collect()
            .await;

        let mut summary = FolderSummary::default();
        for (video_file, outcome) in outcomes {
            match outcome {
                Ok(VideoOutcome::Processed(_)) => summary.processed += 1,
                Ok(VideoOutcome::Skipped(_)) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {:?}: {:#}", video_file, e);
                    summary.failed += 1;
                }
            }
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed in {}: {} processed, {} skipped, {} errors",
            Self::format_duration(start_time.elapsed()),
            summary.processed,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    fn progress_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
