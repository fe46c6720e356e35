use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, info};
use crate::app_config::{MediaConfig, SubtitleStyle};
use crate::errors::ServiceError;
use crate::process;

// @module: Audio extraction and subtitle burn-in through ffmpeg

/// Sample rate the transcriber expects
pub const TRANSCRIPTION_SAMPLE_RATE: u32 = 16_000;

/// Media operations the caption pipeline needs
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Extract the audio track of `video` as a mono 16 kHz WAV file
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), ServiceError>;

    /// Render `subtitles` into the frames of `video`, writing `output`
    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
        style: &SubtitleStyle,
    ) -> Result<(), ServiceError>;
}

/// ffmpeg command-line implementation of [`MediaToolkit`]
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegToolkit {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Check that ffmpeg can be launched
    pub async fn probe(&self) -> Result<String, ServiceError> {
        let output = process::run_command(
            "ffmpeg",
            &self.ffmpeg_path,
            ["-hide_banner", "-version"],
            None,
            Duration::from_secs(30),
            process::trim_stderr,
        )
        .await?;

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("ffmpeg (unknown version)")
            .to_string();
        debug!("Found {}", version);
        Ok(version)
    }

    /// Arguments for the audio extraction call
    pub fn extract_audio_args(video: &Path, audio_out: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-ar".to_string(),
            TRANSCRIPTION_SAMPLE_RATE.to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            audio_out.to_string_lossy().to_string(),
        ]
    }

    /// Arguments for the burn-in call.
    ///
    /// The subtitles filter only gets the bare file name of the SRT file;
    /// ffmpeg has to run inside the directory holding it. This keeps paths
    /// with colons, quotes or backslashes out of the filtergraph.
    pub fn burn_subtitles_args(
        video: &Path,
        subtitles: &Path,
        output: &Path,
        style: &SubtitleStyle,
    ) -> Result<Vec<String>, ServiceError> {
        let srt_name = subtitles
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.contains(['\'', ':', '\\', ',', ';', '[', ']']))
            .ok_or_else(|| ServiceError::Output {
                service: "ffmpeg".to_string(),
                message: format!("Unsupported subtitle file name: {:?}", subtitles),
            })?;

        let filter = format!("subtitles={}:force_style='{}'", srt_name, style.force_style());

        Ok(vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-vf".to_string(),
            filter,
            "-c:a".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ])
    }

    /// Filter ffmpeg stderr to only show meaningful error lines, stripping the
    /// version banner, build configuration, and stream metadata noise.
    pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
        let noise_prefixes = [
            "ffmpeg version",
            "built with",
            "configuration:",
            "libav",
            "libsw",
            "libpostproc",
            "Input #",
            "Metadata:",
            "Duration:",
            "Chapter",
            "Stream #",
            "Side data:",
            "encoder ",
            "handler_name",
            "vendor_id",
            "major_brand",
            "minor_version",
            "compatible_brands",
            "creation_time",
            "Output #",
            "Stream mapping:",
            "Press [q]",
            "frame=",
            "size=",
        ];

        let meaningful: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !noise_prefixes.iter().any(|p| line.starts_with(p)))
            .collect();

        if meaningful.is_empty() {
            "unknown ffmpeg error (stderr was empty after filtering)".to_string()
        } else {
            meaningful.join("\n")
        }
    }
}

/// Absolute form of `path`, resolved against the current directory
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), ServiceError> {
        info!("Extracting audio track");
        process::run_command(
            "ffmpeg",
            &self.ffmpeg_path,
            Self::extract_audio_args(video, audio_out),
            None,
            self.timeout,
            Self::filter_ffmpeg_stderr,
        )
        .await?;

        let size = std::fs::metadata(audio_out).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(ServiceError::Output {
                service: "ffmpeg".to_string(),
                message: "Extracted audio is empty; does the video have an audio track?".to_string(),
            });
        }
        Ok(())
    }

    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
        style: &SubtitleStyle,
    ) -> Result<(), ServiceError> {
        info!("Burning subtitles into video");
        let working_dir = subtitles
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(absolute)
            .unwrap_or_else(|| PathBuf::from("."));

        // The working directory changes, so every other path has to be absolute
        let args = Self::burn_subtitles_args(&absolute(video), subtitles, &absolute(output), style)?;

        process::run_command(
            "ffmpeg",
            &self.ffmpeg_path,
            args,
            Some(&working_dir),
            self.timeout,
            Self::filter_ffmpeg_stderr,
        )
        .await?;

        if !output.exists() {
            return Err(ServiceError::Output {
                service: "ffmpeg".to_string(),
                message: format!("Expected output video was not created: {:?}", output),
            });
        }
        Ok(())
    }
}
