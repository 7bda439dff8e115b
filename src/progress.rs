//! Progress reporting for conversion jobs.
//!
//! A job runs in three phases (download, frame sampling, document
//! assembly). Attach a [`ProgressCallback`] through
//! [`ConverterConfig::with_progress`](crate::ConverterConfig::with_progress)
//! to observe them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidshot::{Converter, ConverterConfig, JobRequest, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {} done", info.operation, info.current);
//!     }
//! }
//!
//! let config = ConverterConfig::new().with_progress(Arc::new(PrintProgress));
//! let converter = Converter::new(config);
//! let request = JobRequest::from_url("https://example.com/talk.mp4", 10);
//! let conversion = converter.convert(request)?;
//! # Ok::<(), vidshot::VidshotError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The phase of a job a [`ProgressInfo`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Fetching a remote video. Units are bytes.
    Download,
    /// Decoding the video and writing sampled frames. Units are frames written.
    FrameSampling,
    /// Writing PDF pages. Units are pages.
    DocumentAssembly,
}

/// A snapshot of job progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which phase is running.
    pub operation: OperationType,
    /// Units processed so far.
    pub current: u64,
    /// Total units expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the phase started.
    pub elapsed: Duration,
    /// Decode index of the frame just written (sampling only).
    pub current_frame: Option<u64>,
}

/// Receives progress updates.
///
/// Callbacks observe the job; they cannot halt it.
pub trait ProgressCallback: Send + Sync {
    /// Called as units of work complete.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. Used when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks one phase and emits callbacks every `batch_size` units.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    units_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: 1,
            start_time: Instant::now(),
            units_since_last_report: 0,
        }
    }

    /// Report at most once per `size` units. Clamped to a minimum of 1.
    pub(crate) fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Record `amount` completed units.
    pub(crate) fn advance(&mut self, amount: u64, frame_number: Option<u64>) {
        self.current += amount;
        self.units_since_last_report += amount;

        if self.units_since_last_report >= self.batch_size {
            self.report(frame_number);
            self.units_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, frame_number: Option<u64>) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| ((self.current as f32 / total as f32) * 100.0).min(100.0));

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            current_frame: frame_number,
        };

        self.callback.on_progress(&info);
    }
}
