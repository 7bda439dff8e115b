//! ConverterConfig, JobRequest and FFmpeg log level tests.

use std::{path::Path, time::Duration};

use vidshot::{
    ConverterConfig, DEFAULT_INTERVAL_SECONDS, DEFAULT_MAX_UPLOAD_SIZE, FfmpegLogLevel,
    JobRequest, parse_interval,
};

// ── ConverterConfig builder ────────────────────────────────────────

#[test]
fn config_defaults() {
    let config = ConverterConfig::new();
    assert_eq!(config.upload_dir(), Path::new("uploads"));
    assert_eq!(config.frame_dir(), Path::new("temp_frames"));
    assert_eq!(config.output_dir(), Path::new("screenshots"));
    assert_eq!(config.allowed_extensions(), ["mp4", "avi", "mov", "mkv"]);
    assert_eq!(config.max_upload_size(), DEFAULT_MAX_UPLOAD_SIZE);
    assert_eq!(config.max_upload_size(), 104_857_600);
    assert_eq!(config.max_download_size(), None);
    assert_eq!(config.jpeg_quality(), 95);
}

#[test]
fn config_debug_hides_callback() {
    let config = ConverterConfig::new().with_download_timeout(Duration::from_secs(5));
    let debug = format!("{config:?}");
    assert!(debug.contains("ConverterConfig"));
    assert!(debug.contains("download_timeout: Some(5s)"));
    assert!(!debug.contains("progress"));
}

#[test]
fn allowed_extensions_are_normalized() {
    let config = ConverterConfig::new().with_allowed_extensions([".WebM", "mp4", "", "."]);
    assert_eq!(config.allowed_extensions(), ["webm", "mp4"]);
    assert!(config.is_allowed_extension("WEBM"));
    assert!(!config.is_allowed_extension("mkv"));
}

#[test]
fn jpeg_quality_is_clamped() {
    assert_eq!(ConverterConfig::new().with_jpeg_quality(0).jpeg_quality(), 1);
    assert_eq!(ConverterConfig::new().with_jpeg_quality(250).jpeg_quality(), 100);
    assert_eq!(ConverterConfig::new().with_jpeg_quality(70).jpeg_quality(), 70);
}

#[test]
fn directories_are_replaced() {
    let config = ConverterConfig::new()
        .with_upload_dir("/tmp/in")
        .with_frame_dir("/tmp/frames")
        .with_output_dir("/tmp/out");
    assert_eq!(config.upload_dir(), Path::new("/tmp/in"));
    assert_eq!(config.frame_dir(), Path::new("/tmp/frames"));
    assert_eq!(config.output_dir(), Path::new("/tmp/out"));
}

// ── JobRequest ─────────────────────────────────────────────────────

#[test]
fn interval_text_falls_back_to_default() {
    assert_eq!(parse_interval("5"), 5);
    assert_eq!(parse_interval("0"), 0);
    for text in ["", "abc", "1.5", "1e3", "10s"] {
        assert_eq!(parse_interval(text), DEFAULT_INTERVAL_SECONDS, "{text:?}");
    }
}

#[test]
fn negative_interval_samples_every_frame() {
    assert_eq!(parse_interval("-1"), 0);
    assert_eq!(parse_interval("-99999999999999999999999"), 0);
    assert_eq!(parse_interval("99999999999999"), u32::MAX);
}

#[test]
fn request_interval_is_whole_seconds() {
    let request = JobRequest::from_url("https://example.com/a.mp4", 7);
    assert_eq!(request.interval(), Duration::from_secs(7));
    assert_eq!(request.url(), Some("https://example.com/a.mp4"));
}

// ── FfmpegLogLevel ─────────────────────────────────────────────────

#[test]
fn log_level_names() {
    assert_eq!(FfmpegLogLevel::from_name("quiet"), Some(FfmpegLogLevel::Quiet));
    assert_eq!(FfmpegLogLevel::from_name("WARN"), Some(FfmpegLogLevel::Warning));
    assert_eq!(FfmpegLogLevel::from_name("warning"), Some(FfmpegLogLevel::Warning));
    assert_eq!(FfmpegLogLevel::from_name("loud"), None);
}
