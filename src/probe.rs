//! Lightweight video probing.
//!
//! [`VideoInfo::probe`] opens a file, reads the best video stream's
//! parameters and closes the demuxer again. The sampler uses the same
//! frame-rate logic, and the CLI prints the result for `vidshot probe`.

use std::{path::Path, time::Duration};

use ffmpeg_next::{Stream, codec::context::Context as CodecContext, media::Type};

use crate::error::VidshotError;

/// Basic properties of a video's primary stream.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate; 0.0 if the container does not report one.
    pub frames_per_second: f64,
    /// Estimated frame count from duration and frame rate.
    pub frame_count: u64,
    /// Container duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl VideoInfo {
    /// Probe the video at `path`.
    ///
    /// # Errors
    ///
    /// - [`VidshotError::VideoOpen`] if the container cannot be opened.
    /// - [`VidshotError::NoVideoStream`] if it holds no video stream.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self, VidshotError> {
        let path = path.as_ref();
        let open_error = |reason: String| VidshotError::VideoOpen {
            path: path.to_path_buf(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;
        let input =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| VidshotError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let duration_microseconds = input.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frames_per_second = stream_frame_rate(&stream);
        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else {
            (duration.as_secs_f64() * frames_per_second) as u64
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
            format: input.format().name().to_string(),
        })
    }
}

/// Frames per second of `stream`.
///
/// Uses the average frame rate, falling back to the stream's nominal rate,
/// and 0.0 when neither is usable.
pub(crate) fn stream_frame_rate(stream: &Stream) -> f64 {
    [stream.avg_frame_rate(), stream.rate()]
        .into_iter()
        .find(|rate| rate.numerator() > 0 && rate.denominator() > 0)
        .map(|rate| rate.numerator() as f64 / rate.denominator() as f64)
        .unwrap_or(0.0)
}
