//! Job tokens and artifact naming.
//!
//! Every conversion gets one [`JobToken`]. The token namespaces the staged
//! upload, the sampled frames and the output PDF, so concurrent jobs sharing
//! the same directories never write to the same file.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Per-job naming key: `YYYYMMDD_HHMMSS_<8 hex chars>`.
///
/// The timestamp is local wall-clock time at second granularity; the hex
/// suffix is taken from a random UUID and distinguishes jobs started within
/// the same second.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobToken(String);

impl JobToken {
    /// Generate a token for a job starting now.
    pub fn generate() -> Self {
        Self::at(Local::now().naive_local())
    }

    /// Generate a token stamped with `timestamp`.
    pub fn at(timestamp: NaiveDateTime) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}_{}", timestamp.format(TIMESTAMP_FORMAT), &suffix[..8]))
    }

    /// The token as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `YYYYMMDD_HHMMSS` part of the token.
    pub fn timestamp(&self) -> &str {
        // Fixed width: 8 date digits, underscore, 6 time digits.
        &self.0[..15]
    }

    /// `video_screenshots_<token>.pdf`
    pub fn document_file_name(&self) -> String {
        format!("video_screenshots_{}.pdf", self.0)
    }

    /// `screenshot_<token>_<NNNN>.jpg`, ordinal zero-padded to four digits.
    pub fn frame_file_name(&self, ordinal: usize) -> String {
        format!("screenshot_{}_{ordinal:04}.jpg", self.0)
    }

    /// `upload_<token>.<extension>`
    pub fn upload_file_name(&self, extension: &str) -> String {
        format!("upload_{}.{extension}", self.0)
    }

    /// Returns `true` if `file_name` was produced for this job.
    pub fn owns(&self, file_name: &str) -> bool {
        file_name.contains(&self.0)
    }
}

impl Display for JobToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
