// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use unembedder::app_config::{self, Config};
use unembedder::app_controller::{Controller, VideoOutcome};
use unembedder::consolidation::{FragmentPolicy, MergePolicy};
use unembedder::file_utils::{FileManager, FileType};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for MergePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliMergePolicy {
    Concatenate,
    TimeSorted,
}

impl From<CliMergePolicy> for MergePolicy {
    fn from(policy: CliMergePolicy) -> Self {
        match policy {
            CliMergePolicy::Concatenate => MergePolicy::Concatenate,
            CliMergePolicy::TimeSorted => MergePolicy::TimeSorted,
        }
    }
}

/// CLI Wrapper for FragmentPolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliFragmentPolicy {
    First,
    Longest,
}

impl From<CliFragmentPolicy> for FragmentPolicy {
    fn from(policy: CliFragmentPolicy) -> Self {
        match policy {
            CliFragmentPolicy::First => FragmentPolicy::First,
            CliFragmentPolicy::Longest => FragmentPolicy::Longest,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract burned-in subtitles from a video or a folder of videos (default command)
    Extract {
        /// Input video file or directory to process
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,
    },

    /// Consolidate a raw band track (merge fragments, drop implausible cues)
    Fix {
        /// Track file, e.g. video_top.srt
        #[arg(value_name = "SRT")]
        track: PathBuf,

        /// Output file (default: <stem>_fixed.srt next to the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Merge a top and a bottom track into one document
    Join {
        /// Top band track
        #[arg(value_name = "TOP")]
        top: PathBuf,

        /// Bottom band track
        #[arg(value_name = "BOTTOM")]
        bottom: PathBuf,

        /// Output file (default: <video>_joined.srt next to the top track)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for unembedder
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Force overwrite of existing output files
    #[arg(short, long, global = true)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// How the top and bottom tracks are merged
    #[arg(long, value_enum, global = true)]
    merge_policy: Option<CliMergePolicy>,

    /// Which fragment of a merged run keeps its text
    #[arg(long, value_enum, global = true)]
    fragment_policy: Option<CliFragmentPolicy>,

    /// Similarity (0-1) at or above which a caption is considered unchanged
    #[arg(short, long, global = true)]
    similarity_threshold: Option<f32>,

    /// Directory for output files (default: next to each video)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,
}

/// Unembedder - burned-in subtitle extractor
///
/// Reads the top and bottom quarter of every video frame, recognizes the text
/// shown there and rebuilds timed SubRip subtitles from it.
#[derive(Parser, Debug)]
#[command(name = "unembedder")]
#[command(version)]
#[command(about = "Extract burned-in subtitles from videos")]
#[command(long_about = "Unembedder reads the top and bottom bands of each video frame, recognizes the
captions shown there and writes them as SubRip subtitles.

EXAMPLES:
    unembedder movie.mp4                          # Extract using default config
    unembedder -f movie.mp4                       # Force overwrite existing files
    unembedder --merge-policy time-sorted movie.mp4
    unembedder fix movie_top.srt                  # Consolidate a raw track
    unembedder join movie_top_fixed.srt movie_bot_fixed.srt
    unembedder --log-level debug /movies/         # Process entire directory with debug logging
    unembedder completions bash > unembedder.bash # Generate bash completions

OUTPUT FILES:
    <video>_top.srt, <video>_bot.srt              Raw band tracks
    <video>_top_fixed.srt, <video>_bot_fixed.srt  Consolidated band tracks
    <video>_joined.srt                            Merged document

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

REQUIREMENTS:
    ffmpeg and ffprobe for decoding, tesseract for text recognition.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    global: GlobalOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger accepts everything; log::set_max_level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => "✅ ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();
    let options = cli.global;

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "unembedder", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Extract { input_path }) => run_extract(input_path, &options).await,
        Some(Commands::Fix { track, output }) => {
            let controller = build_controller(&options)?;
            check_overwrite(output.as_deref(), options.force_overwrite)?;
            controller.fix_file(&track, output)?;
            Ok(())
        }
        Some(Commands::Join { top, bottom, output }) => {
            let controller = build_controller(&options)?;
            check_overwrite(output.as_deref(), options.force_overwrite)?;
            controller.join_files(&top, &bottom, output)?;
            Ok(())
        }
        None => {
            // Default behavior - extract from the top-level input path
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;
            run_extract(input_path, &options).await
        }
    }
}

/// Load the configuration, apply command line overrides and set the log level
fn load_config(options: &GlobalOptions) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(policy) = &options.merge_policy {
        config.merge_policy = policy.clone().into();
    }
    if let Some(policy) = &options.fragment_policy {
        config.consolidation.fragment_policy = policy.clone().into();
    }
    if let Some(threshold) = options.similarity_threshold {
        config.extraction.similarity_threshold = threshold;
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn build_controller(options: &GlobalOptions) -> Result<Controller> {
    let config = load_config(options)?;
    Controller::with_config(config)
}

/// Refuse to replace an explicit output file unless forced
fn check_overwrite(output: Option<&Path>, force_overwrite: bool) -> Result<()> {
    match output {
        Some(path) if path.exists() && !force_overwrite => Err(anyhow!(
            "Output file already exists: {:?}. Use -f to force overwrite.",
            path
        )),
        _ => Ok(()),
    }
}

async fn run_extract(input_path: PathBuf, options: &GlobalOptions) -> Result<()> {
    let controller = build_controller(options)?;

    if input_path.is_file() {
        if FileManager::detect_file_type(&input_path)? == FileType::Subtitle {
            return Err(anyhow!(
                "{:?} is a subtitle file. Use the fix or join command for existing tracks.",
                input_path
            ));
        }

        // Process a single file
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| input_path.parent().unwrap_or(Path::new(".")).to_path_buf());
        if let VideoOutcome::Processed(report) = controller.run(input_path, output_dir, options.force_overwrite).await? {
            info!(
                "Top: {} raw / {} kept, bottom: {} raw / {} kept, {} frames",
                report.raw_cues.0, report.fixed_cues.0, report.raw_cues.1, report.fixed_cues.1, report.frames_processed
            );
        }
    } else if input_path.is_dir() {
        // Process a directory
        let summary = controller
            .run_folder(input_path, options.output_dir.clone(), options.force_overwrite)
            .await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} file(s) failed", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
