//! # vidshot
//!
//! Turn a video into a PDF of screenshots: sample one frame every N seconds
//! and bind the frames into a multi-page document, one frame per page, each
//! page sized to the frame's pixel dimensions at 96 px/inch.
//!
//! Decoding is done by FFmpeg through
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next); the PDF is written
//! with [`lopdf`](https://crates.io/crates/lopdf).
//!
//! ## Quick Start
//!
//! ### Convert an uploaded file
//!
//! ```no_run
//! use vidshot::{Converter, ConverterConfig, JobRequest, Upload};
//!
//! let converter = Converter::new(ConverterConfig::new());
//! let upload = Upload::from_path("lecture.mp4")?;
//! let conversion = converter.convert(JobRequest::from_upload(upload, 10))?;
//! println!("{}", conversion.document.path.display());
//! # Ok::<(), vidshot::VidshotError>(())
//! ```
//!
//! ### Convert a remote video
//!
//! ```no_run
//! use vidshot::{Converter, ConverterConfig, JobRequest};
//!
//! let converter = Converter::new(ConverterConfig::new());
//! let request = JobRequest::from_url("https://example.com/talk.mp4", 30);
//! match converter.convert(request) {
//!     Ok(conversion) => println!("{}", conversion.file_name()),
//!     Err(error) => eprintln!("{error} ({:?})", error.kind()),
//! }
//! ```
//!
//! ### Use the stages directly
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vidshot::{DocumentAssembler, FrameSampler, JobToken};
//!
//! let token = JobToken::generate();
//! let frames = FrameSampler::new("frames").sample("clip.mkv", Duration::from_secs(5), &token)?;
//! let document = DocumentAssembler::new().assemble(&frames.paths(), "clip.pdf")?;
//! assert_eq!(document.page_count, frames.len());
//! # Ok::<(), vidshot::VidshotError>(())
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod acquisition;
pub mod config;
mod conversion;
pub mod converter;
pub mod document;
pub mod error;
pub mod ffmpeg;
pub mod frames;
pub mod job;
pub mod probe;
pub mod progress;
pub mod request;
pub mod sampler;

pub use acquisition::{
    AcquiredVideo, Acquirer, Upload, VideoSource, file_extension, validate_filename, validate_url,
};
pub use config::{
    ConverterConfig, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_INTERVAL_SECONDS, DEFAULT_MAX_UPLOAD_SIZE,
};
pub use converter::{Conversion, Converter};
pub use document::{AssembledDocument, DocumentAssembler, PageSize, pixels_to_mm};
pub use error::{ErrorKind, VidshotError};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frames::{Frame, FrameImage, FrameSet};
pub use job::JobToken;
pub use probe::VideoInfo;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use request::{JobRequest, parse_interval};
pub use sampler::{FrameSampler, sampling_stride};
