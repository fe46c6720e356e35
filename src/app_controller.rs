use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::media::FfmpegToolkit;
use crate::pipeline::{CaptionPipeline, CaptionReport, PipelineOptions};
use crate::transcription::{SrtFileTranscriber, Transcriber, WhisperCliTranscriber};

// @module: Application controller for captioning runs

/// What the user asked for on top of the configuration
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Replace existing outputs
    pub force_overwrite: bool,
    /// Burn this SRT file instead of transcribing
    pub subtitles: Option<PathBuf>,
    /// Write the SRT document instead of a captioned video
    pub subtitles_only: bool,
    /// Keep the SRT document next to the captioned video
    pub keep_srt: bool,
}

type Pipeline = CaptionPipeline<Box<dyn Transcriber>, FfmpegToolkit>;

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pipeline options for a request
    pub fn pipeline_options(&self, request: &RunRequest) -> Result<PipelineOptions> {
        let language = language_utils::normalize_to_part1_or_part2t(&self.config.language)?;
        Ok(PipelineOptions {
            language,
            style: self.config.style.clone(),
            max_input_bytes: self.config.max_input_bytes(),
            subtitles_only: request.subtitles_only,
            keep_srt: request.keep_srt && !request.subtitles_only,
        })
    }

    /// Where the artifact for `input_file` goes when no output was given
    pub fn default_output_path(&self, input_file: &Path, output_dir: &Path, request: &RunRequest) -> PathBuf {
        if request.subtitles_only {
            let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
            output_dir.join(format!("{}.srt", stem))
        } else {
            FileManager::generate_output_path(input_file, output_dir)
        }
    }

    /// Set up the transcriber and media services once for a whole invocation
    async fn build_pipeline(&self, request: &RunRequest, progress: &ProgressBar) -> Result<Pipeline> {
        let media = FfmpegToolkit::new(&self.config.media);
        // Needed for burn-in, and for audio extraction when transcribing
        if !request.subtitles_only || request.subtitles.is_none() {
            media.probe().await.context("ffmpeg is required to caption videos")?;
        }

        let transcriber: Box<dyn Transcriber> = match &request.subtitles {
            Some(path) => {
                if !FileManager::file_exists(path) {
                    return Err(anyhow!("Subtitle file does not exist: {:?}", path));
                }
                Box::new(SrtFileTranscriber::new(path.clone()))
            }
            None => {
                let whisper = WhisperCliTranscriber::initialize(&self.config.transcription)
                    .await
                    .context("The whisper model runner is not available")?;
                Box::new(whisper)
            }
        };

        let pb = progress.clone();
        let pipeline = CaptionPipeline::new(transcriber, media, self.pipeline_options(request)?)
            .with_stage_observer(move |stage| pb.set_message(stage.to_string()));
        Ok(pipeline)
    }

    /// Caption a single video file
    pub async fn run(&self, input_file: PathBuf, output: Option<PathBuf>, request: RunRequest) -> Result<Option<CaptionReport>> {
        if !input_file.is_file() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let destination = match output {
            Some(path) => path,
            None => {
                let dir = input_file.parent().unwrap_or(Path::new(".")).to_path_buf();
                self.default_output_path(&input_file, &dir, &request)
            }
        };

        if destination.exists() && !request.force_overwrite {
            warn!("Skipping file, output already exists (use -f to force overwrite): {:?}", destination);
            return Ok(None);
        }

        let progress = Self::spinner();
        let result = match self.build_pipeline(&request, &progress).await {
            Ok(pipeline) => Self::caption_one(&pipeline, &input_file, &destination, &progress).await,
            Err(e) => Err(e),
        };
        progress.finish_and_clear();

        let report = result?;
        Ok(Some(report))
    }

    /// Caption every accepted video under `input_dir`, one after another.
    ///
    /// Outputs go next to each input, or under `output_dir` if given. A
    /// failed file is logged and the next one continues.
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: Option<PathBuf>, request: RunRequest) -> Result<Vec<CaptionReport>> {
        let start_time = std::time::Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        if request.subtitles.is_some() {
            return Err(anyhow!("A subtitle file can only be burned into a single video"));
        }

        let videos = FileManager::find_videos(&input_dir)?;
        if videos.is_empty() {
            warn!("No video files found in {:?}", input_dir);
            return Ok(Vec::new());
        }
        info!("Found {} video file(s) in {:?}", videos.len(), input_dir);

        let progress = Self::spinner();
        let pipeline = match self.build_pipeline(&request, &progress).await {
            Ok(pipeline) => pipeline,
            Err(e) => {
                progress.finish_and_clear();
                return Err(e);
            }
        };

        let mut reports = Vec::new();
        let mut failed = 0;
        for (i, video) in videos.iter().enumerate() {
            let dir = match &output_dir {
                Some(dir) => dir.clone(),
                None => video.parent().unwrap_or(Path::new(".")).to_path_buf(),
            };
            let destination = self.default_output_path(video, &dir, &request);

            if destination.exists() && !request.force_overwrite {
                warn!("Skipping {:?}, output already exists (use -f to force overwrite)", video);
                continue;
            }

            progress.set_prefix(format!("[{}/{}]", i + 1, videos.len()));
            match Self::caption_one(&pipeline, video, &destination, &progress).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    failed += 1;
                    error!("Failed to caption {:?}: {:#}", video, e);
                }
            }
        }
        progress.finish_and_clear();

        info!(
            "Captioned {} file(s), {} failed, in {}",
            reports.len(),
            failed,
            Self::format_duration(start_time.elapsed())
        );
        Ok(reports)
    }

    async fn caption_one(pipeline: &Pipeline, input: &Path, destination: &Path, progress: &ProgressBar) -> Result<CaptionReport> {
        progress.set_message("Starting");
        let report = pipeline
            .run(input, destination)
            .await
            .with_context(|| format!("Captioning failed for {:?}", input))?;

        info!(
            "Success: {} ({} subtitle entries, {})",
            report.output.display(),
            report.segment_count,
            Self::format_duration(report.elapsed)
        );
        if let Some(srt) = &report.subtitles {
            info!("Subtitles kept at {}", srt.display());
        }
        Ok(report)
    }

    fn spinner() -> ProgressBar {
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.enable_steady_tick(Duration::from_millis(120));
        progress
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
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
