/*!
 * Tests for the application controller
 */

use std::path::{Path, PathBuf};
use anyhow::Result;
use captionburn::app_config::Config;
use captionburn::app_controller::{Controller, RunRequest};
use crate::common;

#[test]
fn test_with_config_withInvalidConfig_shouldFail() {
    let config = Config {
        language: "klingon".to_string(),
        ..Config::default()
    };
    assert!(Controller::with_config(config).is_err());
}

#[test]
fn test_pipeline_options_withBibliographicCode_shouldNormalizeLanguage() -> Result<()> {
    let config = Config {
        language: "ger".to_string(),
        ..Config::default()
    };
    let controller = Controller::with_config(config)?;

    let options = controller.pipeline_options(&RunRequest::default())?;
    assert_eq!(options.language, "de");
    assert_eq!(options.max_input_bytes, 200 * 1024 * 1024);
    Ok(())
}

#[test]
fn test_pipeline_options_withSubtitlesOnly_shouldDropKeepSrt() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let request = RunRequest {
        subtitles_only: true,
        keep_srt: true,
        ..RunRequest::default()
    };

    let options = controller.pipeline_options(&request)?;
    assert!(options.subtitles_only);
    assert!(!options.keep_srt);
    Ok(())
}

#[test]
fn test_default_output_path_withVideoMode_shouldUseCaptionSuffix() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let output = controller.default_output_path(Path::new("/videos/talk.mov"), Path::new("/videos"), &RunRequest::default());
    assert_eq!(output, PathBuf::from("/videos/talk_with_captions.mp4"));
    Ok(())
}

#[test]
fn test_default_output_path_withSubtitlesOnly_shouldUseSrtExtension() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let request = RunRequest {
        subtitles_only: true,
        ..RunRequest::default()
    };
    let output = controller.default_output_path(Path::new("/videos/talk.mov"), Path::new("/out"), &request);
    assert_eq!(output, PathBuf::from("/out/talk.srt"));
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipWithoutForce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_fake_video(temp_dir.path(), "talk.mp4")?;
    let existing = common::create_test_file(temp_dir.path(), "talk_with_captions.mp4", "earlier run")?;
    let controller = Controller::with_config(Config::default())?;

    let report = controller.run(input, None, RunRequest::default()).await?;
    assert!(report.is_none());
    assert_eq!(std::fs::read_to_string(&existing)?, "earlier run");
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(Config::default())?;

    let result = controller
        .run(temp_dir.path().join("missing.mp4"), None, RunRequest::default())
        .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingFfmpeg_shouldFailBeforeWritingOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_fake_video(temp_dir.path(), "talk.mp4")?;
    let mut config = Config::default();
    config.media.ffmpeg_path = "captionburn-no-such-ffmpeg".to_string();
    let controller = Controller::with_config(config)?;

    let result = controller.run(input, None, RunRequest::default()).await;
    assert!(result.is_err());
    assert!(!temp_dir.path().join("talk_with_captions.mp4").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_folder_withSubtitleOverride_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitles = common::create_test_subtitle(temp_dir.path(), "edited.srt")?;
    let controller = Controller::with_config(Config::default())?;
    let request = RunRequest {
        subtitles: Some(subtitles),
        ..RunRequest::default()
    };

    let result = controller.run_folder(temp_dir.path().to_path_buf(), None, request).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_run_folder_withNoVideos_shouldReturnNoReports() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "notes.txt", "nothing to caption")?;
    let controller = Controller::with_config(Config::default())?;

    let reports = controller
        .run_folder(temp_dir.path().to_path_buf(), None, RunRequest::default())
        .await?;
    assert!(reports.is_empty());
    Ok(())
}

#[test]
fn test_format_duration_withVariousLengths_shouldBeHumanReadable() {
    use std::time::Duration;

    assert_eq!(Controller::format_duration(Duration::from_millis(2500)), "2.500s");
    assert_eq!(Controller::format_duration(Duration::from_secs(125)), "2m 5s");
    assert_eq!(Controller::format_duration(Duration::from_secs(3725)), "1h 2m 5s");
}
