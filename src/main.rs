// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use captionburn::app_config::{self, Config};
use captionburn::app_controller::{Controller, RunRequest};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for captionburn
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct CaptionArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file (single input) or output directory (directory input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Spoken language code passed to the model (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    language: Option<String>,

    /// Whisper model name (tiny, base, small, medium, large)
    #[arg(short, long)]
    model: Option<String>,

    /// Subtitle font size
    #[arg(long)]
    font_size: Option<u32>,

    /// Subtitle primary colour as an ASS literal (e.g. '&HFFFFFF&')
    #[arg(long)]
    colour: Option<String>,

    /// Burn this SRT file instead of transcribing
    #[arg(long, value_name = "SRT")]
    subtitles: Option<PathBuf>,

    /// Write the SRT file only, without burning it into the video
    #[arg(long, conflicts_with = "keep_srt")]
    subtitles_only: bool,

    /// Keep the generated SRT file next to the captioned video
    #[arg(long)]
    keep_srt: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// captionburn - burned-in captions from speech
///
/// Transcribes the speech in a video with Whisper, writes SRT subtitles and
/// burns them into a copy of the video with ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "captionburn")]
#[command(version)]
#[command(about = "Generate and burn captions into videos")]
#[command(long_about = "captionburn transcribes the speech in a video, writes SRT subtitles and burns them into a copy of the video.

EXAMPLES:
    captionburn talk.mp4                        # Writes talk_with_captions.mp4
    captionburn -l es -m small talk.mkv         # Spanish audio, 'small' model
    captionburn -o out.mp4 --keep-srt talk.mov  # Custom output, keep out.srt
    captionburn --subtitles-only talk.mp4       # Only write talk.srt
    captionburn --subtitles fixed.srt talk.mp4  # Burn an edited subtitle file
    captionburn /videos/                        # Caption every video in a directory
    captionburn completions bash > captionburn.bash

REQUIREMENTS:
    ffmpeg (built with libass) and the openai-whisper command-line runner
    must be on PATH, or configured in conf.json.

CONFIGURATION:
    Settings are read from conf.json when it exists. Command line options
    override file values.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    args: CaptionArgs,
}

// @struct: Custom logger implementation, filtered by log::max_level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI colour for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "captionburn", &mut std::io::stdout());
            Ok(())
        }
        None => run_caption(cli.args).await,
    }
}

/// Load the config file (if any) and apply command line overrides
fn load_config(options: &CaptionArgs) -> Result<Config> {
    let mut config = Config::load_or_default(&options.config_path)?;

    if let Some(language) = &options.language {
        config.language = language.clone();
    }
    if let Some(model) = &options.model {
        config.transcription.model = model.clone();
    }
    if let Some(font_size) = options.font_size {
        config.style.font_size = font_size;
    }
    if let Some(colour) = &options.colour {
        config.style.primary_colour = colour.clone();
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }

    Ok(config)
}

async fn run_caption(options: CaptionArgs) -> Result<()> {
    if let Some(level) = options.log_level {
        log::set_max_level(app_config::LogLevel::from(level).into());
    }

    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    let config = load_config(&options).context("Failed to load configuration")?;
    log::set_max_level(config.log_level.into());

    let controller = Controller::with_config(config)?;
    let request = RunRequest {
        force_overwrite: options.force_overwrite,
        subtitles: options.subtitles.clone(),
        subtitles_only: options.subtitles_only,
        keep_srt: options.keep_srt,
    };

    if input_path.is_file() {
        controller.run(input_path, options.output.clone(), request).await?;
    } else if input_path.is_dir() {
        let reports = controller.run_folder(input_path, options.output.clone(), request).await?;
        info!("Done: {} output file(s) written", reports.len());
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
