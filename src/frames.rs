//! Sampled frames and their on-disk images.
//!
//! [`FrameSet`] owns every [`FrameImage`] written for one job and deletes
//! them when it is dropped, so frame files never outlive the job whether
//! assembly succeeds or fails.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::RgbImage;

use crate::job::JobToken;

/// One decoded frame, before it is written to disk.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based index in decode order.
    pub index: u64,
    /// RGB pixel data.
    pub image: RgbImage,
}

impl Frame {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A sampled frame persisted as a standalone JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    /// Location of the encoded image.
    pub path: PathBuf,
    /// Position within the job, starting at 0. Defines page order.
    pub ordinal: usize,
    /// Decode index of the source frame.
    pub source_index: u64,
}

/// Ordered, owned collection of one job's frame images.
///
/// Ordinals are assigned by [`push`](FrameSet::push) and are gap-free.
#[derive(Debug)]
pub struct FrameSet {
    token: JobToken,
    directory: PathBuf,
    frames: Vec<FrameImage>,
}

impl FrameSet {
    /// Create an empty set whose files live in `directory`.
    pub fn new<P: Into<PathBuf>>(token: JobToken, directory: P) -> Self {
        Self {
            token,
            directory: directory.into(),
            frames: Vec::new(),
        }
    }

    /// The job token the frame files are named after.
    pub fn token(&self) -> &JobToken {
        &self.token
    }

    /// Path the next pushed frame should be written to.
    pub fn next_path(&self) -> PathBuf {
        self.directory
            .join(self.token.frame_file_name(self.frames.len()))
    }

    /// Register an image already written to `path`.
    pub fn push(&mut self, path: PathBuf, source_index: u64) -> &FrameImage {
        let ordinal = self.frames.len();
        self.frames.push(FrameImage {
            path,
            ordinal,
            source_index,
        });
        &self.frames[ordinal]
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frames were sampled.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in sampling order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameImage> {
        self.frames.iter()
    }

    /// Image paths in sampling order.
    pub fn paths(&self) -> Vec<&Path> {
        self.frames.iter().map(|frame| frame.path.as_path()).collect()
    }

    /// Decode indices of the sampled frames.
    pub fn source_indices(&self) -> Vec<u64> {
        self.frames.iter().map(|frame| frame.source_index).collect()
    }

    /// Delete every frame file now. Returns how many were removed.
    ///
    /// Files that are already gone are not counted; other failures are
    /// logged and skipped.
    pub fn cleanup(mut self) -> usize {
        self.remove_files()
    }

    /// Give up ownership of the files without deleting them.
    pub fn keep(mut self) -> Vec<FrameImage> {
        std::mem::take(&mut self.frames)
    }

    fn remove_files(&mut self) -> usize {
        let mut removed = 0;
        for frame in self.frames.drain(..) {
            match fs::remove_file(&frame.path) {
                Ok(()) => removed += 1,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => {
                    log::warn!("Failed to remove frame {}: {error}", frame.path.display());
                }
            }
        }
        removed
    }
}

impl Drop for FrameSet {
    fn drop(&mut self) {
        if !self.frames.is_empty() {
            let removed = self.remove_files();
            log::debug!("Removed {removed} frame file(s) for job {}", self.token);
        }
    }
}
