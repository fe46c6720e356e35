/*!
 * Tests for ffmpeg argument building and stderr filtering
 */

use std::path::Path;
use captionburn::app_config::SubtitleStyle;
use captionburn::errors::ServiceError;
use captionburn::media::{FfmpegToolkit, TRANSCRIPTION_SAMPLE_RATE};

#[test]
fn test_extract_audio_args_withPaths_shouldRequestMono16kPcm() {
    let args = FfmpegToolkit::extract_audio_args(Path::new("in put.mp4"), Path::new("/tmp/run/audio.wav"));

    assert_eq!(
        args,
        vec![
            "-y", "-i", "in put.mp4", "-vn", "-ac", "1", "-ar", "16000", "-c:a", "pcm_s16le", "/tmp/run/audio.wav",
        ]
    );
    assert_eq!(TRANSCRIPTION_SAMPLE_RATE, 16_000);
}

#[test]
fn test_burn_subtitles_args_withStyle_shouldUseBareSrtNameAndForceStyle() {
    let style = SubtitleStyle {
        font_size: 30,
        primary_colour: "&H00FFFF&".to_string(),
    };
    let args = FfmpegToolkit::burn_subtitles_args(
        Path::new("/videos/my: talk.mp4"),
        Path::new("/tmp/captionburn-1/captions.srt"),
        Path::new("/tmp/captionburn-1/output.mp4"),
        &style,
    )
    .unwrap();

    assert_eq!(
        args,
        vec![
            "-y",
            "-i",
            "/videos/my: talk.mp4",
            "-vf",
            "subtitles=captions.srt:force_style='Fontsize=30,PrimaryColour=&H00FFFF&'",
            "-c:a",
            "copy",
            "/tmp/captionburn-1/output.mp4",
        ]
    );
}

#[test]
fn test_burn_subtitles_args_withFilterMetacharactersInName_shouldReject() {
    for name in ["it's.srt", "a:b.srt", "a,b.srt", "a[0].srt"] {
        let result = FfmpegToolkit::burn_subtitles_args(
            Path::new("in.mp4"),
            Path::new(name),
            Path::new("out.mp4"),
            &SubtitleStyle::default(),
        );
        assert!(matches!(result, Err(ServiceError::Output { .. })), "{} was accepted", name);
    }
}

#[test]
fn test_filter_ffmpeg_stderr_withBannerNoise_shouldKeepErrorLines() {
    let stderr = "ffmpeg version 6.1 Copyright (c) 2000-2023\n  built with gcc 13\n  configuration: --enable-libass\n  libavutil      58. 29.100\n  libswscale      7.  5.100\nInput #0, mov,mp4, from 'in.mp4':\n  Metadata:\n    major_brand     : isom\n  Duration: 00:00:10.00\n  Stream #0:0: Video: h264\n[Parsed_subtitles_0 @ 0x1] Unable to open captions.srt\nError initializing filter 'subtitles' with args 'captions.srt'\n";

    let filtered = FfmpegToolkit::filter_ffmpeg_stderr(stderr);
    assert_eq!(
        filtered,
        "[Parsed_subtitles_0 @ 0x1] Unable to open captions.srt\nError initializing filter 'subtitles' with args 'captions.srt'"
    );
}

#[test]
fn test_filter_ffmpeg_stderr_withOnlyNoise_shouldReturnPlaceholder() {
    let filtered = FfmpegToolkit::filter_ffmpeg_stderr("ffmpeg version 6.1\nframe=  100 fps=25\n");
    assert!(filtered.contains("unknown ffmpeg error"));
}
