//! Job orchestration.
//!
//! [`Converter::convert`] runs one job end to end: acquire the video, sample
//! frames, release the video, assemble the PDF, delete the frames. It
//! returns either the finished document or the first error encountered.
//!
//! Temporary artifacts are held by guards ([`AcquiredVideo`],
//! [`FrameSet`](crate::FrameSet)), so the video copy and the frame images
//! are removed on every exit path, including a failed assembly.
//!
//! # Example
//!
//! ```no_run
//! use vidshot::{Converter, ConverterConfig, JobRequest, Upload};
//!
//! let converter = Converter::new(ConverterConfig::new().with_output_dir("out"));
//! let request = JobRequest::from_upload(Upload::from_path("lecture.mp4")?, 10);
//! let conversion = converter.convert(request)?;
//! println!("wrote {}", conversion.document.path.display());
//! # Ok::<(), vidshot::VidshotError>(())
//! ```

use std::{fs, sync::Arc};

use crate::{
    acquisition::{AcquiredVideo, Acquirer, Upload},
    config::ConverterConfig,
    document::{AssembledDocument, DocumentAssembler},
    error::VidshotError,
    frames::FrameSet,
    job::JobToken,
    request::JobRequest,
    sampler::FrameSampler,
};

/// Result of a successful job.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The job's naming token.
    pub token: JobToken,
    /// The written PDF.
    pub document: AssembledDocument,
    /// Decode indices of the frames that became pages, in page order.
    pub sampled_frames: Vec<u64>,
}

impl Conversion {
    /// File name of the PDF, e.g. `video_screenshots_<token>.pdf`.
    pub fn file_name(&self) -> String {
        self.token.document_file_name()
    }
}

/// Runs conversion jobs against a fixed configuration.
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// The configuration jobs run with.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Run one job.
    ///
    /// # Errors
    ///
    /// - Validation errors for a missing input, a bad URL or a disallowed
    ///   file type.
    /// - [`VidshotError::DownloadFailed`] if the remote video cannot be
    ///   fetched.
    /// - Decode errors from the sampler, unchanged.
    /// - [`VidshotError::DocumentCreation`] wrapping the assembler's error.
    pub fn convert(&self, request: JobRequest) -> Result<Conversion, VidshotError> {
        let token = JobToken::generate();
        log::info!("Starting job {token}");

        let interval = request.interval();
        let url = request.url().map(str::to_owned);
        let video = self.acquire(url.as_deref(), request.upload, &token)?;

        fs::create_dir_all(&self.config.frame_dir)?;
        let sampler = FrameSampler::new(self.config.frame_dir.clone())
            .with_jpeg_quality(self.config.jpeg_quality)
            .with_progress(Arc::clone(&self.config.progress));
        let sampled = sampler.sample(video.path(), interval, &token);

        // The video copy goes as soon as decoding is over, whatever the outcome.
        if let Err(error) = video.release() {
            log::warn!("Failed to remove video copy for job {token}: {error}");
        }
        let frames = sampled?;

        // On failure `frames` is dropped here and its files go with it.
        let document = self
            .assemble(&frames, &token)
            .map_err(|error| VidshotError::DocumentCreation(Box::new(error)))?;

        let sampled_frames = frames.source_indices();
        let removed = frames.cleanup();
        log::debug!("Job {token}: removed {removed} frame file(s)");
        log::info!(
            "Job {token} finished: {} page(s) in {}",
            document.page_count,
            document.path.display()
        );

        Ok(Conversion {
            token,
            document,
            sampled_frames,
        })
    }

    fn assemble(
        &self,
        frames: &FrameSet,
        token: &JobToken,
    ) -> Result<AssembledDocument, VidshotError> {
        fs::create_dir_all(&self.config.output_dir)?;
        let output = self.config.output_dir.join(token.document_file_name());
        DocumentAssembler::new()
            .with_jpeg_quality(self.config.jpeg_quality)
            .with_progress(Arc::clone(&self.config.progress))
            .assemble(&frames.paths(), &output)
    }

    fn acquire(
        &self,
        url: Option<&str>,
        upload: Option<Upload>,
        token: &JobToken,
    ) -> Result<AcquiredVideo, VidshotError> {
        let acquirer = Acquirer::new(&self.config);
        match (url, upload) {
            (Some(url), _) => acquirer.fetch(url, token),
            (None, Some(upload)) => acquirer.stage_upload(upload, token),
            (None, None) => Err(VidshotError::NoInput),
        }
    }
}
