//! Inbound job requests.

use std::{num::IntErrorKind, time::Duration};

use crate::{acquisition::Upload, config::DEFAULT_INTERVAL_SECONDS};

/// One conversion request, independent of how it arrived.
///
/// At most one of `video_url` and `upload` is used: a non-blank URL wins.
#[derive(Debug)]
pub struct JobRequest {
    /// Seconds between sampled frames. 0 samples every frame.
    pub interval_seconds: u32,
    /// Remote video location.
    pub video_url: Option<String>,
    /// Uploaded video.
    pub upload: Option<Upload>,
}

impl JobRequest {
    /// Request sampling the video at `url`.
    pub fn from_url<S: Into<String>>(url: S, interval_seconds: u32) -> Self {
        Self {
            interval_seconds,
            video_url: Some(url.into()),
            upload: None,
        }
    }

    /// Request sampling an uploaded video.
    pub fn from_upload(upload: Upload, interval_seconds: u32) -> Self {
        Self {
            interval_seconds,
            video_url: None,
            upload: Some(upload),
        }
    }

    /// The sampling interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_seconds))
    }

    /// The URL, if present and not blank.
    pub fn url(&self) -> Option<&str> {
        self.video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Parse a textual interval in whole seconds.
///
/// Anything that is not an integer falls back to the default (10 s).
/// Integers are honoured: negative values become 0 (every frame) and values
/// past `u32::MAX` saturate.
pub fn parse_interval(text: &str) -> u32 {
    match text.trim().parse::<i64>() {
        Ok(seconds) => u32::try_from(seconds.max(0)).unwrap_or(u32::MAX),
        Err(error) => match error.kind() {
            IntErrorKind::PosOverflow => u32::MAX,
            IntErrorKind::NegOverflow => 0,
            _ => DEFAULT_INTERVAL_SECONDS,
        },
    }
}
