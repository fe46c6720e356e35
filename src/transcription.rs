/*!
 * Speech-to-text through a pretrained Whisper model.
 *
 * The pipeline only sees the [`Transcriber`] trait. [`WhisperCliTranscriber`]
 * drives the `whisper` command-line runner: it is created once with
 * [`WhisperCliTranscriber::initialize`], which checks the runner can be
 * launched, and owns a scratch directory that is removed when it is
 * dropped. [`SrtFileTranscriber`] stands in for the model when an
 * existing subtitle file should be burned in as-is.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use tempfile::TempDir;
use crate::app_config::TranscriptionConfig;
use crate::errors::ServiceError;
use crate::process;
use crate::subtitle_processor::{SubtitleDocument, TimedSegment};

/// Output of one transcription
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Language the model transcribed in
    pub language: String,
    /// Segments in the order the model produced them
    pub segments: Vec<TimedSegment>,
}

/// A speech-to-text service
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short description for logs, e.g. "whisper (base)"
    fn describe(&self) -> String;

    /// Whether `transcribe` reads the audio file; if not, extraction is skipped
    fn needs_audio(&self) -> bool {
        true
    }

    /// Transcribe a mono 16 kHz audio file, hinting the spoken language
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<Transcript, ServiceError>;
}

#[async_trait]
impl<T: Transcriber + ?Sized> Transcriber for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn needs_audio(&self) -> bool {
        (**self).needs_audio()
    }

    async fn transcribe(&self, audio: &Path, language: &str) -> Result<Transcript, ServiceError> {
        (**self).transcribe(audio, language).await
    }
}

// @struct: Whisper JSON output, only the fields we read
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

/// Whisper command-line runner
#[derive(Debug)]
pub struct WhisperCliTranscriber {
    command: String,
    model: String,
    timeout: Duration,
    scratch: TempDir,
}

impl WhisperCliTranscriber {
    /// Check the runner can be launched and set up the scratch directory
    pub async fn initialize(config: &TranscriptionConfig) -> Result<Self, ServiceError> {
        process::run_command(
            "whisper",
            &config.command,
            ["--help"],
            None,
            Duration::from_secs(60),
            Self::filter_whisper_stderr,
        )
        .await?;

        let scratch = tempfile::Builder::new()
            .prefix("captionburn-whisper-")
            .tempdir()
            .map_err(|e| ServiceError::Launch {
                program: config.command.clone(),
                message: format!("Failed to create scratch directory: {}", e),
            })?;

        info!("Transcriber ready: {} (model {})", config.command, config.model);

        Ok(Self {
            command: config.command.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            scratch,
        })
    }

    /// Arguments for one transcription call
    pub fn transcribe_args(&self, audio: &Path, language: &str, output_dir: &Path) -> Vec<String> {
        vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--language".to_string(),
            language.to_string(),
            "--task".to_string(),
            "transcribe".to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--fp16".to_string(),
            "False".to_string(),
            "--verbose".to_string(),
            "False".to_string(),
        ]
    }

    /// Parse the runner's JSON output into a transcript
    pub fn parse_whisper_json(json: &str, requested_language: &str) -> Result<Transcript, ServiceError> {
        let output: WhisperOutput = serde_json::from_str(json).map_err(|e| ServiceError::Output {
            service: "whisper".to_string(),
            message: format!("Failed to parse transcription JSON: {}", e),
        })?;

        let segments = output
            .segments
            .into_iter()
            .map(|s| TimedSegment::new(s.start, s.end, s.text))
            .collect();

        Ok(Transcript {
            language: output.language.unwrap_or_else(|| requested_language.to_string()),
            segments,
        })
    }

    /// Keep the tail of a Python traceback, which holds the actual error
    fn filter_whisper_stderr(stderr: &str) -> String {
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let tail = &lines[lines.len().saturating_sub(5)..];
        process::trim_stderr(&tail.join("\n"))
    }

    fn output_path(output_dir: &Path, audio: &Path) -> PathBuf {
        let stem = audio.file_stem().unwrap_or_default().to_string_lossy();
        output_dir.join(format!("{}.json", stem))
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    fn describe(&self) -> String {
        format!("whisper ({})", self.model)
    }

    async fn transcribe(&self, audio: &Path, language: &str) -> Result<Transcript, ServiceError> {
        // One output directory per call so runs sharing this service never collide
        let output_dir = tempfile::Builder::new()
            .prefix("run-")
            .tempdir_in(self.scratch.path())
            .map_err(|e| ServiceError::Output {
                service: "whisper".to_string(),
                message: format!("Failed to create output directory: {}", e),
            })?;

        info!("Transcribing audio with {}", self.describe());
        process::run_command(
            "whisper",
            &self.command,
            self.transcribe_args(audio, language, output_dir.path()),
            None,
            self.timeout,
            Self::filter_whisper_stderr,
        )
        .await?;

        let json_path = Self::output_path(output_dir.path(), audio);
        debug!("Reading transcription from {:?}", json_path);
        let json = std::fs::read_to_string(&json_path).map_err(|e| ServiceError::Output {
            service: "whisper".to_string(),
            message: format!("Missing transcription output {:?}: {}", json_path, e),
        })?;

        let transcript = Self::parse_whisper_json(&json, language)?;
        if transcript.segments.is_empty() {
            warn!("No speech detected in audio");
        }

        if let Err(e) = output_dir.close() {
            warn!("Failed to remove transcription output directory: {}", e);
        }

        Ok(transcript)
    }
}

/// Reads segments from an existing SRT file instead of running a model
#[derive(Debug, Clone)]
pub struct SrtFileTranscriber {
    path: PathBuf,
}

impl SrtFileTranscriber {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Transcriber for SrtFileTranscriber {
    fn describe(&self) -> String {
        format!("subtitle file {:?}", self.path)
    }

    fn needs_audio(&self) -> bool {
        false
    }

    async fn transcribe(&self, _audio: &Path, language: &str) -> Result<Transcript, ServiceError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| ServiceError::Output {
            service: "subtitle file".to_string(),
            message: format!("Cannot read {:?}: {}", self.path, e),
        })?;

        let segments = SubtitleDocument::parse_srt_string(&content).map_err(|e| ServiceError::Output {
            service: "subtitle file".to_string(),
            message: e.to_string(),
        })?;
        info!("Loaded {} subtitle entries from {:?}", segments.len(), self.path);

        Ok(Transcript {
            language: language.to_string(),
            segments,
        })
    }
}
