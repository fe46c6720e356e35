/*!
 * # captionburn - burned-in captions from speech
 *
 * A Rust library and CLI that transcribes the speech in a video with a
 * pretrained Whisper model, writes the transcript as SRT subtitles and
 * burns them into the video with ffmpeg.
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: SRT timestamp formatting, serialization and parsing
 * - `transcription`: the `Transcriber` seam and the Whisper runner
 * - `media`: the `MediaToolkit` seam and the ffmpeg implementation
 * - `pipeline`: one captioning run over injected services
 * - `app_controller`: builds services from config, single file and folder runs
 * - `app_config`: configuration loading and validation
 * - `file_utils`: input validation, output naming, artifact delivery
 * - `language_utils`: ISO language code utilities
 * - `errors`: custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod pipeline;
pub mod process;
pub mod subtitle_processor;
pub mod transcription;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ServiceError, SubtitleError};
pub use pipeline::{CaptionPipeline, CaptionReport, PipelineOptions};
pub use subtitle_processor::{format_time, serialize, SubtitleDocument, SubtitleEntry, TimedSegment};
pub use transcription::{Transcriber, Transcript};
