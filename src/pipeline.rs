/*!
 * Caption pipeline: audio extraction, transcription, SRT serialization,
 * burn-in and delivery, for one input video per run.
 *
 * Every intermediate artifact lives in a [`RunWorkspace`], a temporary
 * directory named after the run id. The workspace is removed when the run
 * ends, whichever way it ends; only the delivered artifact survives.
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use tempfile::TempDir;
use uuid::Uuid;
use crate::app_config::SubtitleStyle;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::media::MediaToolkit;
use crate::subtitle_processor::{SubtitleDocument, TimedSegment};
use crate::transcription::Transcriber;

const AUDIO_FILE: &str = "audio.wav";
const SUBTITLE_FILE: &str = "captions.srt";
const OUTPUT_FILE: &str = "output.mp4";

/// Stages reported to a stage observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractAudio,
    Transcribe,
    LoadSubtitles,
    WriteSubtitles,
    BurnSubtitles,
    Deliver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::ExtractAudio => "Extracting audio",
            Stage::Transcribe => "Transcribing",
            Stage::LoadSubtitles => "Loading subtitles",
            Stage::WriteSubtitles => "Writing subtitles",
            Stage::BurnSubtitles => "Burning in subtitles",
            Stage::Deliver => "Saving output",
        };
        f.write_str(label)
    }
}

/// Per-run settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Language hint for the transcriber
    pub language: String,
    /// Burned-in subtitle style
    pub style: SubtitleStyle,
    /// Input size limit in bytes
    pub max_input_bytes: u64,
    /// Deliver the SRT document instead of a captioned video
    pub subtitles_only: bool,
    /// Also keep the SRT document next to the delivered video
    pub keep_srt: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            style: SubtitleStyle::default(),
            max_input_bytes: 200 * 1024 * 1024,
            subtitles_only: false,
            keep_srt: false,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct CaptionReport {
    pub run_id: Uuid,
    /// The delivered artifact
    pub output: PathBuf,
    /// SRT file kept next to the output, if requested
    pub subtitles: Option<PathBuf>,
    pub segment_count: usize,
    pub language: String,
    pub elapsed: Duration,
}

/// Temporary directory holding one run's intermediate files
#[derive(Debug)]
pub struct RunWorkspace {
    run_id: Uuid,
    dir: TempDir,
}

impl RunWorkspace {
    /// Create a workspace under `root`, or the system temp directory
    pub fn create(root: Option<&Path>) -> Result<Self, AppError> {
        let run_id = Uuid::new_v4();
        let prefix = format!("captionburn-{}-", run_id);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match root {
            Some(root) => {
                FileManager::ensure_dir(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| AppError::File(format!("Failed to create run workspace: {}", e)))?;

        debug!("Run {} workspace: {:?}", run_id, dir.path());
        Ok(Self { run_id, dir })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn audio_path(&self) -> PathBuf {
        self.dir.path().join(AUDIO_FILE)
    }

    pub fn subtitles_path(&self) -> PathBuf {
        self.dir.path().join(SUBTITLE_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE)
    }

    /// Remove the workspace and everything in it
    pub fn release(self) -> Result<(), AppError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| AppError::ResourceCleanup {
            path,
            message: e.to_string(),
        })
    }
}

type StageObserver = Box<dyn Fn(Stage) + Send + Sync>;

/// Orchestrates one captioning run over injected services
pub struct CaptionPipeline<T: Transcriber, M: MediaToolkit> {
    transcriber: T,
    media: M,
    options: PipelineOptions,
    workspace_root: Option<PathBuf>,
    observer: Option<StageObserver>,
}

impl<T: Transcriber, M: MediaToolkit> CaptionPipeline<T, M> {
    pub fn new(transcriber: T, media: M, options: PipelineOptions) -> Self {
        Self {
            transcriber,
            media,
            options,
            workspace_root: None,
            observer: None,
        }
    }

    /// Place run workspaces under `root` instead of the system temp directory
    pub fn with_workspace_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Get told when each stage starts
    pub fn with_stage_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(Stage) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Caption `input` and deliver the result at `destination`.
    ///
    /// Either the full artifact ends up at `destination` or nothing does.
    /// The run workspace is removed on every path; failing to remove it is
    /// logged and does not fail the run.
    pub async fn run(&self, input: &Path, destination: &Path) -> Result<CaptionReport, AppError> {
        let started = Instant::now();
        FileManager::validate_input(input, self.options.max_input_bytes)?;
        if FileManager::same_path(input, destination) {
            return Err(AppError::InvalidInput(format!(
                "Output path must differ from the input: {:?}",
                destination
            )));
        }

        let workspace = RunWorkspace::create(self.workspace_root.as_deref())?;
        let run_id = workspace.run_id();
        info!("Run {}: captioning {:?}", run_id, input);

        let result = self.run_in(&workspace, input, destination).await;

        if let Err(e) = workspace.release() {
            warn!("Run {}: {}", run_id, e);
        }

        let (segment_count, language, subtitles) = result?;
        let elapsed = started.elapsed();
        info!("Run {}: finished in {:.1}s", run_id, elapsed.as_secs_f64());

        Ok(CaptionReport {
            run_id,
            output: destination.to_path_buf(),
            subtitles,
            segment_count,
            language,
            elapsed,
        })
    }

    async fn run_in(
        &self,
        workspace: &RunWorkspace,
        input: &Path,
        destination: &Path,
    ) -> Result<(usize, String, Option<PathBuf>), AppError> {
        let (segments, language) = self.collect_segments(workspace, input).await?;

        self.notify(Stage::WriteSubtitles);
        let document = SubtitleDocument::from_segments(&segments)?;
        if document.is_empty() {
            warn!("Transcript is empty; the output will carry no captions");
        }
        let srt_path = document
            .write_to_srt(workspace.subtitles_path())
            .map_err(|e| AppError::File(e.to_string()))?;
        info!("Generated {} subtitle entries", document.len());

        if self.options.subtitles_only {
            self.notify(Stage::Deliver);
            FileManager::deliver(&srt_path, destination).map_err(|e| AppError::File(e.to_string()))?;
            return Ok((document.len(), language, None));
        }

        self.notify(Stage::BurnSubtitles);
        let rendered = workspace.output_path();
        self.media
            .burn_subtitles(input, &srt_path, &rendered, &self.options.style)
            .await?;

        self.notify(Stage::Deliver);
        FileManager::deliver(&rendered, destination).map_err(|e| AppError::File(e.to_string()))?;

        let subtitles = if self.options.keep_srt {
            let sidecar = FileManager::sidecar_srt_path(destination);
            match std::fs::copy(&srt_path, &sidecar) {
                Ok(_) => Some(sidecar),
                Err(e) => {
                    warn!("Failed to keep subtitles at {:?}: {}", sidecar, e);
                    None
                }
            }
        } else {
            None
        };

        Ok((document.len(), language, subtitles))
    }

    async fn collect_segments(
        &self,
        workspace: &RunWorkspace,
        input: &Path,
    ) -> Result<(Vec<TimedSegment>, String), AppError> {
        let audio = workspace.audio_path();

        if self.transcriber.needs_audio() {
            self.notify(Stage::ExtractAudio);
            self.media.extract_audio(input, &audio).await?;
            self.notify(Stage::Transcribe);
        } else {
            self.notify(Stage::LoadSubtitles);
        }

        let transcript = self
            .transcriber
            .transcribe(&audio, &self.options.language)
            .await?;
        info!(
            "Got {} segments from {} ({})",
            transcript.segments.len(),
            self.transcriber.describe(),
            transcript.language
        );

        Ok((transcript.segments, transcript.language))
    }

    fn notify(&self, stage: Stage) {
        debug!("Stage: {}", stage);
        if let Some(observer) = &self.observer {
            observer(stage);
        }
    }
}
