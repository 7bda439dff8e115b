//! Fixed-interval frame sampling.
//!
//! [`FrameSampler`] decodes a video front to back and writes every
//! `stride`-th frame to a JPEG, where the stride is the number of frames in
//! one sampling interval. Frame 0 is always included.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vidshot::{FrameSampler, JobToken};
//!
//! let sampler = FrameSampler::new("frames");
//! let frames = sampler.sample("talk.mp4", Duration::from_secs(10), &JobToken::generate())?;
//! println!("sampled {} frames", frames.len());
//! # Ok::<(), vidshot::VidshotError>(())
//! ```

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder, frame::Video as VideoFrame, media::Type,
};
use image::codecs::jpeg::JpegEncoder;

use crate::{
    conversion::RgbConverter,
    error::VidshotError,
    frames::{Frame, FrameSet},
    job::JobToken,
    probe::stream_frame_rate,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
};

/// Number of decoded frames between two sampled frames.
///
/// `floor(frames_per_second × interval)`, clamped to at least 1 so a short
/// interval or an unknown frame rate samples every frame instead of
/// dividing by zero.
pub fn sampling_stride(frames_per_second: f64, interval: Duration) -> u64 {
    let stride = (frames_per_second * interval.as_secs_f64()).floor();
    if stride.is_finite() && stride >= 1.0 {
        stride as u64
    } else {
        1
    }
}

/// Decodes a video sequentially and writes sampled frames to disk.
pub struct FrameSampler {
    frame_dir: PathBuf,
    jpeg_quality: u8,
    progress: Arc<dyn ProgressCallback>,
}

impl FrameSampler {
    /// Create a sampler writing into `frame_dir`.
    pub fn new<P: Into<PathBuf>>(frame_dir: P) -> Self {
        Self {
            frame_dir: frame_dir.into(),
            jpeg_quality: 95,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the JPEG quality of written frames. Clamped to `1..=100`.
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

    /// Sample `video` every `interval`, naming files after `token`.
    ///
    /// An empty set is a valid result for a video with no decodable frames.
    ///
    /// # Errors
    ///
    /// - [`VidshotError::VideoOpen`] / [`VidshotError::NoVideoStream`] if the
    ///   video cannot be opened for decoding.
    /// - [`VidshotError::IoError`] / [`VidshotError::ImageError`] if a frame
    ///   cannot be written. Frames written so far are deleted.
    pub fn sample<P: AsRef<Path>>(
        &self,
        video: P,
        interval: Duration,
        token: &JobToken,
    ) -> Result<FrameSet, VidshotError> {
        let path = video.as_ref();
        let open_error = |reason: String| VidshotError::VideoOpen {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!("Sampling {} every {interval:?}", path.display());

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;
        let mut input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let (stream_index, frames_per_second, estimated_frames, mut decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or_else(|| VidshotError::NoVideoStream {
                    path: path.to_path_buf(),
                })?;
            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;
            (
                stream.index(),
                stream_frame_rate(&stream),
                stream.frames().max(0) as u64,
                decoder,
            )
        };

        let stride = sampling_stride(frames_per_second, interval);
        log::debug!("{frames_per_second:.3} fps, sampling every {stride} frame(s)");

        let total = (estimated_frames > 0).then(|| estimated_frames.div_ceil(stride));
        let mut sink = FrameSink {
            frames: FrameSet::new(token.clone(), self.frame_dir.clone()),
            converter: RgbConverter::new(),
            tracker: ProgressTracker::new(
                Arc::clone(&self.progress),
                OperationType::FrameSampling,
                total,
            ),
            jpeg_quality: self.jpeg_quality,
            stride,
            decoded_count: 0,
            stopped: false,
        };

        let mut decoded_frame = VideoFrame::empty();
        let mut eof_sent = false;

        loop {
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                sink.accept(&decoded_frame)?;
            }

            if eof_sent || sink.stopped {
                break;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut input_context) {
                Ok(()) => {
                    if packet.stream() != stream_index {
                        continue;
                    }
                    if let Err(error) = decoder.send_packet(&packet) {
                        log::warn!(
                            "Decode error after {} frame(s), treating as end of stream: {error}",
                            sink.decoded_count
                        );
                        flush(&mut decoder, &mut decoded_frame, &mut sink)?;
                        break;
                    }
                }
                Err(FfmpegError::Eof) => {
                    eof_sent = true;
                    if let Err(error) = decoder.send_eof() {
                        log::warn!("Failed to flush decoder: {error}");
                        break;
                    }
                }
                Err(error) => {
                    log::warn!(
                        "Read error after {} frame(s), treating as end of stream: {error}",
                        sink.decoded_count
                    );
                    flush(&mut decoder, &mut decoded_frame, &mut sink)?;
                    break;
                }
            }
        }

        sink.tracker.finish();
        log::info!(
            "Sampled {} of {} decoded frame(s) from {}",
            sink.frames.len(),
            sink.decoded_count,
            path.display()
        );

        Ok(sink.frames)
    }
}

/// Drain whatever the decoder still buffers after a read or decode failure.
fn flush(
    decoder: &mut VideoDecoder,
    decoded_frame: &mut VideoFrame,
    sink: &mut FrameSink,
) -> Result<(), VidshotError> {
    if decoder.send_eof().is_ok() {
        while decoder.receive_frame(decoded_frame).is_ok() {
            sink.accept(decoded_frame)?;
        }
    }
    Ok(())
}

/// Receives every decoded frame and keeps the ones on the stride.
struct FrameSink {
    frames: FrameSet,
    converter: RgbConverter,
    tracker: ProgressTracker,
    jpeg_quality: u8,
    stride: u64,
    decoded_count: u64,
    /// Set when a frame could not be converted; later frames are ignored.
    stopped: bool,
}

impl FrameSink {
    fn accept(&mut self, decoded: &VideoFrame) -> Result<(), VidshotError> {
        if self.stopped {
            return Ok(());
        }

        let index = self.decoded_count;
        self.decoded_count += 1;

        if index % self.stride != 0 {
            return Ok(());
        }

        let frame = match self.converter.convert(decoded, index) {
            Ok(image) => Frame { index, image },
            Err(error) => {
                log::warn!("{error}, treating as end of stream");
                self.stopped = true;
                return Ok(());
            }
        };

        let path = self.frames.next_path();
        if let Err(error) = write_jpeg(&frame, &path, self.jpeg_quality) {
            // Not yet owned by the frame set, so remove it here.
            let _ = fs::remove_file(&path);
            return Err(error);
        }
        let written = self.frames.push(path, index);
        log::debug!("Frame {index} -> {}", written.path.display());

        self.tracker.advance(1, Some(index));
        Ok(())
    }
}

fn write_jpeg(frame: &Frame, path: &Path, quality: u8) -> Result<(), VidshotError> {
    let mut writer = BufWriter::new(File::create(path)?);
    JpegEncoder::new_with_quality(&mut writer, quality).encode_image(&frame.image)?;
    writer.flush()?;
    Ok(())
}
