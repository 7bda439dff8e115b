//! Getting a video onto local disk.
//!
//! Two ways in: an uploaded byte stream is staged into the upload directory
//! after its filename passes the extension check, and a remote URL is
//! fetched with a single streaming GET into a temporary file. Either way the
//! result is an [`AcquiredVideo`] that deletes its file when released or
//! dropped.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs::{self, File},
    io::{self, Read, Write},
    net::IpAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use reqwest::{Url, blocking::Client};
use tempfile::NamedTempFile;

use crate::{
    config::ConverterConfig,
    error::VidshotError,
    job::JobToken,
    progress::{OperationType, ProgressTracker},
};

/// Download chunk size.
const CHUNK_SIZE: usize = 8 * 1024;

/// Download progress is reported once per mebibyte.
const DOWNLOAD_REPORT_BYTES: u64 = 1024 * 1024;

/// Where a video comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A file already on local disk.
    Local(PathBuf),
    /// A remote HTTP(S) resource.
    Remote(Url),
}

/// An uploaded video: its client-side filename and its content.
pub struct Upload {
    filename: String,
    reader: Box<dyn Read + Send>,
}

impl Debug for Upload {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

impl Upload {
    /// Wrap a byte stream received under `filename`.
    pub fn new<S: Into<String>, R: Read + Send + 'static>(filename: S, reader: R) -> Self {
        Self {
            filename: filename.into(),
            reader: Box::new(reader),
        }
    }

    /// Read the upload from a local file, using its file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VidshotError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, File::open(path)?))
    }

    /// The client-side filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Lower-cased final dot-suffix of `filename`, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Check `filename` against the configured extensions.
///
/// # Errors
///
/// [`VidshotError::EmptyFilename`] for a blank name,
/// [`VidshotError::InvalidFileType`] for a missing or disallowed extension.
pub fn validate_filename(
    filename: &str,
    config: &ConverterConfig,
) -> Result<String, VidshotError> {
    if filename.trim().is_empty() {
        return Err(VidshotError::EmptyFilename);
    }

    match file_extension(filename) {
        Some(extension) if config.is_allowed_extension(&extension) => Ok(extension),
        _ => Err(VidshotError::InvalidFileType {
            filename: filename.to_string(),
            allowed: config.allowed_extensions().join(", "),
        }),
    }
}

/// Parse and check a remote video URL without touching the network.
///
/// The URL needs a scheme and a host; only `http` and `https` are accepted.
pub fn validate_url(raw: &str) -> Result<Url, VidshotError> {
    let trimmed = raw.trim();
    let invalid = || VidshotError::InvalidUrl {
        url: trimmed.to_string(),
    };

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(VidshotError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

enum Holder {
    Staged(PathBuf),
    Downloaded(NamedTempFile),
}

/// A local copy of the job's video, deleted when released or dropped.
pub struct AcquiredVideo {
    holder: Option<Holder>,
    path: PathBuf,
    source: VideoSource,
}

impl Debug for AcquiredVideo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AcquiredVideo")
            .field("path", &self.path)
            .field("source", &self.source)
            .finish()
    }
}

impl AcquiredVideo {
    /// Local path of the video data.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the video came from.
    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    /// Delete the local copy now.
    pub fn release(mut self) -> Result<(), VidshotError> {
        self.remove()
    }

    fn remove(&mut self) -> Result<(), VidshotError> {
        match self.holder.take() {
            Some(Holder::Staged(path)) => match fs::remove_file(&path) {
                Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error.into()),
                _ => Ok(()),
            },
            Some(Holder::Downloaded(file)) => Ok(file.close()?),
            None => Ok(()),
        }
    }
}

impl Drop for AcquiredVideo {
    fn drop(&mut self) {
        if let Err(error) = self.remove() {
            log::warn!("Failed to remove video copy {}: {error}", self.path.display());
        }
    }
}

/// Stages uploads and downloads remote videos according to a config.
pub struct Acquirer<'a> {
    config: &'a ConverterConfig,
}

impl<'a> Acquirer<'a> {
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    /// Validate `upload` and copy it to `upload_<token>.<ext>` in the upload
    /// directory.
    ///
    /// # Errors
    ///
    /// Validation errors from [`validate_filename`], or
    /// [`VidshotError::UploadTooLarge`] when the stream exceeds the ceiling.
    /// Nothing is left on disk on failure.
    pub fn stage_upload(
        &self,
        upload: Upload,
        token: &JobToken,
    ) -> Result<AcquiredVideo, VidshotError> {
        let extension = validate_filename(&upload.filename, self.config)?;

        fs::create_dir_all(&self.config.upload_dir)?;
        let path = self.config.upload_dir.join(token.upload_file_name(&extension));
        let limit = self.config.max_upload_size;

        // The guard removes the partial file on every early return below.
        let staged = AcquiredVideo {
            holder: Some(Holder::Staged(path.clone())),
            path: path.clone(),
            source: VideoSource::Local(path.clone()),
        };

        let mut file = File::create(&path)?;
        let mut limited = upload.reader.take(limit.saturating_add(1));
        let written = io::copy(&mut limited, &mut file)?;
        file.flush()?;

        if written > limit {
            return Err(VidshotError::UploadTooLarge { limit });
        }

        log::info!(
            "Staged upload {} ({written} bytes) at {}",
            upload.filename,
            path.display()
        );
        Ok(staged)
    }

    /// Fetch `raw_url` into a temporary file in the upload directory.
    ///
    /// Exactly one GET is made; there are no retries.
    ///
    /// # Errors
    ///
    /// Validation errors from [`validate_url`] (before any network I/O), or
    /// [`VidshotError::DownloadFailed`] on a transport error, a non-success
    /// status, or a body over the configured download ceiling.
    pub fn fetch(&self, raw_url: &str, token: &JobToken) -> Result<AcquiredVideo, VidshotError> {
        let url = validate_url(raw_url)?;
        let failed = |reason: String| VidshotError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        // `None` disables the blocking client's built-in 30 s limit.
        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .timeout(self.config.download_timeout);
        if is_loopback(&url) {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|error| failed(error.to_string()))?;

        log::info!("Downloading {url}");
        let mut response = client
            .get(url.clone())
            .send()
            .map_err(|error| failed(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        fs::create_dir_all(&self.config.upload_dir)?;
        let mut temporary = tempfile::Builder::new()
            .prefix(&format!("download_{token}_"))
            .suffix(&download_suffix(&url, self.config))
            .tempfile_in(&self.config.upload_dir)?;

        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.config.progress),
            OperationType::Download,
            response.content_length(),
        )
        .with_batch_size(DOWNLOAD_REPORT_BYTES);

        let mut buffer = [0_u8; CHUNK_SIZE];
        let mut downloaded: u64 = 0;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|error| failed(error.to_string()))?;
            if read == 0 {
                break;
            }

            downloaded += read as u64;
            if let Some(limit) = self.config.max_download_size {
                if downloaded > limit {
                    return Err(failed(format!("exceeds {limit} bytes")));
                }
            }

            temporary.write_all(&buffer[..read])?;
            tracker.advance(read as u64, None);
        }
        temporary.flush()?;
        tracker.finish();

        let path = temporary.path().to_path_buf();
        log::info!("Downloaded {downloaded} bytes to {}", path.display());

        Ok(AcquiredVideo {
            holder: Some(Holder::Downloaded(temporary)),
            path,
            source: VideoSource::Remote(url),
        })
    }
}

/// Loopback hosts are never sent through a system proxy.
fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|address| address.is_loopback()),
        None => false,
    }
}

/// Keep the URL's extension on the temporary file when it is an accepted
/// one, so FFmpeg's format guess has something to work with.
fn download_suffix(url: &Url, config: &ConverterConfig) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(file_extension)
        .filter(|extension| config.is_allowed_extension(extension))
        .map(|extension| format!(".{extension}"))
        .unwrap_or_default()
}
