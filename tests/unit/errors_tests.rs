/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;
use captionburn::errors::{AppError, ServiceError, SubtitleError};

#[test]
fn test_subtitle_error_display_withInvertedRange_shouldNamePosition() {
    let error = SubtitleError::InvertedRange {
        index: 3,
        start: 5.0,
        end: 4.5,
    };
    let message = error.to_string();

    assert!(message.contains("Segment 3"));
    assert!(message.contains("5"));
    assert!(message.contains("4.5"));
}

#[test]
fn test_service_error_display_withTimeout_shouldNameServiceAndLimit() {
    let error = ServiceError::Timeout {
        service: "ffmpeg".to_string(),
        secs: 1800,
    };
    assert_eq!(error.to_string(), "ffmpeg timed out after 1800 seconds");
}

#[test]
fn test_service_error_display_withFailure_shouldIncludeStderr() {
    let error = ServiceError::Failed {
        service: "whisper".to_string(),
        status: "exit status: 1".to_string(),
        message: "RuntimeError: model not found".to_string(),
    };
    let message = error.to_string();

    assert!(message.starts_with("whisper failed"));
    assert!(message.contains("RuntimeError: model not found"));
}

#[test]
fn test_app_error_from_service_error_shouldWrapAsExternalService() {
    let error: AppError = ServiceError::Launch {
        program: "ffmpeg".to_string(),
        message: "No such file or directory".to_string(),
    }
    .into();

    assert!(matches!(error, AppError::ExternalService(ServiceError::Launch { .. })));
    assert!(error.to_string().contains("Failed to launch ffmpeg"));
}

#[test]
fn test_app_error_from_subtitle_error_shouldWrapAsSubtitle() {
    let error: AppError = SubtitleError::InvalidTime(-1.0).into();
    assert!(matches!(error, AppError::Subtitle(SubtitleError::InvalidTime(_))));
}

#[test]
fn test_app_error_from_io_error_shouldWrapAsFile() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: AppError = io_error.into();
    assert!(matches!(error, AppError::File(ref m) if m.contains("denied")));
}

#[test]
fn test_app_error_from_anyhow_shouldWrapAsUnknown() {
    let error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(error, AppError::Unknown(ref m) if m == "something odd"));
}

#[test]
fn test_app_error_display_withCleanupFailure_shouldIncludePath() {
    let error = AppError::ResourceCleanup {
        path: PathBuf::from("/tmp/captionburn-run"),
        message: "busy".to_string(),
    };
    let message = error.to_string();

    assert!(message.contains("captionburn-run"));
    assert!(message.contains("busy"));
}
