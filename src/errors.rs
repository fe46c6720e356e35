/*!
 * Error types for the captionburn application.
 *
 * This module contains custom error types for the different parts of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while formatting, serializing or parsing subtitles
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// A time offset that cannot be rendered as an SRT timestamp
    #[error("Invalid time offset: {0} (must be a finite, non-negative number of seconds)")]
    InvalidTime(f64),

    /// A segment whose end lies before its start
    #[error("Segment {index} ends before it starts: start {start}s, end {end}s")]
    InvertedRange {
        /// 1-based position of the segment in the document
        index: usize,
        /// Start offset in seconds
        start: f64,
        /// End offset in seconds
        end: f64,
    },

    /// Malformed SRT content
    #[error("Failed to parse subtitle content: {0}")]
    Parse(String),
}

/// Errors raised by the external collaborators (model runner, ffmpeg)
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The external program could not be started at all
    #[error("Failed to launch {program}: {message}")]
    Launch {
        /// Program name or path
        program: String,
        /// Underlying OS error
        message: String,
    },

    /// The external program ran but reported failure
    #[error("{service} failed with status {status}: {message}")]
    Failed {
        /// Which service failed ("ffmpeg", "whisper", ...)
        service: String,
        /// Exit status description
        status: String,
        /// Filtered stderr output
        message: String,
    },

    /// The external program did not finish in time
    #[error("{service} timed out after {secs} seconds")]
    Timeout {
        /// Which service timed out
        service: String,
        /// Configured timeout
        secs: u64,
    },

    /// The program succeeded but its output could not be used
    #[error("Unusable output from {service}: {message}")]
    Output {
        /// Which service produced the output
        service: String,
        /// What was wrong with it
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or unsupported input file, or malformed segment data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error from the transcription or media service
    #[error("External service failure: {0}")]
    ExternalService(#[from] ServiceError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// A temporary artifact could not be removed
    #[error("Failed to clean up {path:?}: {message}")]
    ResourceCleanup {
        /// Artifact that was left behind
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
