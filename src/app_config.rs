use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles loading and validating the configuration settings.
/// The file is optional; every field has a default.

// @const: ASS colour literal, e.g. &HFFFFFF& or &H00FFFFFF
static COLOUR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&H([0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})&?$").expect("static colour regex is valid")
});

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Spoken language hint passed to the transcriber (ISO code)
    #[serde(default = "default_language")]
    pub language: String,

    /// Largest accepted input file, in megabytes
    #[serde(default = "default_max_input_mb")]
    pub max_input_mb: u64,

    /// Transcription service config
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Media tool config
    #[serde(default)]
    pub media: MediaConfig,

    /// Burned-in subtitle style
    #[serde(default)]
    pub style: SubtitleStyle,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech-to-text model runner settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptionConfig {
    /// Model runner executable
    #[serde(default = "default_whisper_command")]
    pub command: String,

    /// Model name ("tiny", "base", "small", "medium", "large")
    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// Timeout for one transcription, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            command: default_whisper_command(),
            model: default_whisper_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// ffmpeg settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MediaConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Timeout for one ffmpeg invocation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Style applied to burned-in subtitles
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubtitleStyle {
    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Primary colour as an ASS colour literal (&HBBGGRR&)
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,
}

impl SubtitleStyle {
    /// Value for ffmpeg's `force_style` option
    pub fn force_style(&self) -> String {
        format!("Fontsize={},PrimaryColour={}", self.font_size, self.primary_colour)
    }

    pub fn validate(&self) -> Result<()> {
        if self.font_size == 0 || self.font_size > 200 {
            return Err(anyhow!("Font size must be between 1 and 200, got {}", self.font_size));
        }
        if !COLOUR_REGEX.is_match(&self.primary_colour) {
            return Err(anyhow!(
                "Primary colour must look like &HFFFFFF& (ASS BGR hex), got '{}'",
                self.primary_colour
            ));
        }
        Ok(())
    }
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            primary_colour: default_primary_colour(),
        }
    }
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

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_input_mb() -> u64 {
    200
}

fn default_whisper_command() -> String {
    "whisper".to_string()
}

fn default_whisper_model() -> String {
    // "base" trades accuracy for speed; "medium" or "large" are more accurate
    "base".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_timeout_secs() -> u64 {
    1800
}

fn default_font_size() -> u32 {
    24
}

fn default_primary_colour() -> String {
    "&HFFFFFF&".to_string()
}

impl Config {
    /// Load configuration from a JSON file, or defaults if it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.language)
            .context("Invalid transcription language")?;

        if self.max_input_mb == 0 {
            return Err(anyhow!("max_input_mb must be greater than zero"));
        }
        if self.transcription.command.trim().is_empty() {
            return Err(anyhow!("Transcription command must not be empty"));
        }
        if self.transcription.model.trim().is_empty() {
            return Err(anyhow!("Transcription model must not be empty"));
        }
        if self.media.ffmpeg_path.trim().is_empty() {
            return Err(anyhow!("ffmpeg path must not be empty"));
        }
        if self.transcription.timeout_secs == 0 || self.media.timeout_secs == 0 {
            return Err(anyhow!("Timeouts must be greater than zero"));
        }

        self.style.validate()
    }

    /// Input size limit in bytes
    pub fn max_input_bytes(&self) -> u64 {
        self.max_input_mb.saturating_mul(1024 * 1024)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language: default_language(),
            max_input_mb: default_max_input_mb(),
            transcription: TranscriptionConfig::default(),
            media: MediaConfig::default(),
            style: SubtitleStyle::default(),
            log_level: LogLevel::default(),
        }
    }
}
