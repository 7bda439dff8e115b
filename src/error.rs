//! Error types for the `vidshot` crate.
//!
//! [`VidshotError`] is returned by every fallible operation. Each variant
//! belongs to one [`ErrorKind`], so callers can tell a malformed request
//! from a remote server that did not answer without matching on message
//! text.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use lopdf::Error as PdfError;
use thiserror::Error;

/// Broad classification of a [`VidshotError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself was malformed (bad URL, wrong file type, no input).
    Validation,
    /// The remote video could not be fetched.
    Acquisition,
    /// The video container or codec could not be opened.
    Decode,
    /// The PDF could not be produced.
    Assembly,
    /// Any other runtime fault (I/O, image encoding, FFmpeg internals).
    Unexpected,
}

/// The unified error type for all `vidshot` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VidshotError {
    /// The URL could not be parsed or lacks a scheme or host.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// The URL exactly as supplied.
        url: String,
    },

    /// The URL is well formed but its scheme cannot be fetched over HTTP.
    #[error("Invalid URL: unsupported scheme `{scheme}` (expected http or https)")]
    UnsupportedScheme {
        /// The scheme found in the URL.
        scheme: String,
    },

    /// The uploaded file's extension is not in the allowed set.
    #[error("Invalid file type: {filename} (allowed: {allowed})")]
    InvalidFileType {
        /// Name of the rejected file.
        filename: String,
        /// Comma-separated list of accepted extensions.
        allowed: String,
    },

    /// Neither a URL nor an upload was provided.
    #[error("No video provided: provide either a file or URL")]
    NoInput,

    /// An upload was provided with an empty filename.
    #[error("No file selected")]
    EmptyFilename,

    /// The uploaded byte stream exceeded the configured ceiling.
    #[error("Upload too large: exceeds {limit} bytes")]
    UploadTooLarge {
        /// The ceiling in bytes.
        limit: u64,
    },

    /// The remote video could not be downloaded.
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed {
        /// The URL that was fetched.
        url: String,
        /// Transport error or HTTP status.
        reason: String,
    },

    /// The video container or codec could not be opened.
    #[error("Could not open video file {path}: {reason}")]
    VideoOpen {
        /// Path passed to the sampler.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The file opened but contains no video stream.
    #[error("Could not open video file {path}: no video stream found")]
    NoVideoStream {
        /// Path passed to the sampler.
        path: PathBuf,
    },

    /// A decoded frame could not be turned into an RGB image.
    #[error("Failed to convert decoded frame {index}: {reason}")]
    FrameConversion {
        /// Zero-based decode index of the frame.
        index: u64,
        /// Underlying reason.
        reason: String,
    },

    /// The assembler was handed an empty frame sequence.
    #[error("No images to assemble")]
    NoImages,

    /// The PDF could not be created.
    #[error("Failed to create PDF: {0}")]
    DocumentCreation(#[source] Box<VidshotError>),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding or probing a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error from the PDF writer.
    #[error("PDF error: {0}")]
    PdfError(#[from] PdfError),
}

impl VidshotError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VidshotError::InvalidUrl { .. }
            | VidshotError::UnsupportedScheme { .. }
            | VidshotError::InvalidFileType { .. }
            | VidshotError::NoInput
            | VidshotError::EmptyFilename
            | VidshotError::UploadTooLarge { .. } => ErrorKind::Validation,
            VidshotError::DownloadFailed { .. } => ErrorKind::Acquisition,
            VidshotError::VideoOpen { .. }
            | VidshotError::NoVideoStream { .. }
            | VidshotError::FrameConversion { .. } => ErrorKind::Decode,
            VidshotError::NoImages | VidshotError::DocumentCreation(_) => ErrorKind::Assembly,
            VidshotError::FfmpegError(_)
            | VidshotError::IoError(_)
            | VidshotError::ImageError(_)
            | VidshotError::PdfError(_) => ErrorKind::Unexpected,
        }
    }
}

impl From<FfmpegError> for VidshotError {
    fn from(error: FfmpegError) -> Self {
        VidshotError::FfmpegError(error.to_string())
    }
}
