//! Converter configuration.
//!
//! [`ConverterConfig`] is an immutable bundle of directories, limits and
//! tuning knobs handed to [`Converter::new`](crate::Converter::new). It is
//! built once with the `with_*` methods and never mutated by a job.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vidshot::ConverterConfig;
//!
//! let config = ConverterConfig::new()
//!     .with_output_dir("screenshots")
//!     .with_frame_dir("frames")
//!     .with_download_timeout(Duration::from_secs(120))
//!     .with_jpeg_quality(90);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Extensions accepted for uploaded videos, compared case-insensitively.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Upload ceiling: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Sampling interval used when a request does not carry a usable one.
pub const DEFAULT_INTERVAL_SECONDS: u32 = 10;

/// Browser-like user agent sent with remote video requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Configuration for [`Converter`](crate::Converter).
#[derive(Clone)]
pub struct ConverterConfig {
    /// Where uploads are staged and remote videos are downloaded.
    pub(crate) upload_dir: PathBuf,
    /// Scratch directory for sampled frame images.
    pub(crate) frame_dir: PathBuf,
    /// Where finished PDFs are written.
    pub(crate) output_dir: PathBuf,
    /// Lower-cased accepted upload extensions.
    pub(crate) allowed_extensions: Vec<String>,
    pub(crate) max_upload_size: u64,
    /// `None` keeps remote downloads unbounded.
    pub(crate) max_download_size: Option<u64>,
    pub(crate) user_agent: String,
    /// `None` leaves the HTTP client's default in place.
    pub(crate) download_timeout: Option<Duration>,
    pub(crate) jpeg_quality: u8,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ConverterConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConverterConfig")
            .field("upload_dir", &self.upload_dir)
            .field("frame_dir", &self.frame_dir)
            .field("output_dir", &self.output_dir)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_upload_size", &self.max_upload_size)
            .field("max_download_size", &self.max_download_size)
            .field("download_timeout", &self.download_timeout)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterConfig {
    /// Create a configuration with default settings.
    ///
    /// Defaults: `uploads/`, `temp_frames/` and `screenshots/` relative to
    /// the working directory, the four standard video extensions, a 100 MiB
    /// upload ceiling, unbounded downloads, JPEG quality 95, no progress
    /// callback.
    pub fn new() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            frame_dir: PathBuf::from("temp_frames"),
            output_dir: PathBuf::from("screenshots"),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|extension| extension.to_string())
                .collect(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            max_download_size: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            download_timeout: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the directory uploads are staged into and downloads land in.
    #[must_use]
    pub fn with_upload_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.upload_dir = dir.into();
        self
    }

    /// Set the scratch directory for sampled frames.
    #[must_use]
    pub fn with_frame_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.frame_dir = dir.into();
        self
    }

    /// Set the directory finished PDFs are written to.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Replace the accepted upload extensions.
    ///
    /// Leading dots are stripped and values are lower-cased.
    #[must_use]
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|extension| extension.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|extension| !extension.is_empty())
            .collect();
        self
    }

    /// Set the upload ceiling in bytes.
    #[must_use]
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// Cap the size of remote downloads. `None` (the default) means unbounded.
    #[must_use]
    pub fn with_max_download_size(mut self, bytes: Option<u64>) -> Self {
        self.max_download_size = bytes;
        self
    }

    /// Override the `User-Agent` header sent with remote requests.
    #[must_use]
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set an overall timeout for remote downloads.
    #[must_use]
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Set the JPEG quality for sampled frames. Clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Directory uploads are staged into.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Scratch directory for sampled frames.
    pub fn frame_dir(&self) -> &Path {
        &self.frame_dir
    }

    /// Directory finished PDFs are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Accepted upload extensions, lower-cased.
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Upload ceiling in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Download ceiling in bytes, if any.
    pub fn max_download_size(&self) -> Option<u64> {
        self.max_download_size
    }

    /// JPEG quality used for sampled frames.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Returns `true` if `extension` is accepted, ignoring case.
    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}
