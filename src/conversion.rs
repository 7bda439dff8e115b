//! Decoded-frame to [`RgbImage`] conversion.

use ffmpeg_next::{
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::error::VidshotError;

/// Converts decoded frames of any pixel format to packed RGB24.
///
/// The scaling context is rebuilt whenever the source format or
/// dimensions change, which some streams do mid-file.
pub(crate) struct RgbConverter {
    scaler: Option<ScalingContext>,
    source: (Pixel, u32, u32),
    rgb_frame: VideoFrame,
}

impl RgbConverter {
    pub(crate) fn new() -> Self {
        Self {
            scaler: None,
            source: (Pixel::None, 0, 0),
            rgb_frame: VideoFrame::empty(),
        }
    }

    /// Convert `decoded` at its native resolution.
    pub(crate) fn convert(
        &mut self,
        decoded: &VideoFrame,
        index: u64,
    ) -> Result<RgbImage, VidshotError> {
        let source = (decoded.format(), decoded.width(), decoded.height());
        let (_, width, height) = source;
        if width == 0 || height == 0 {
            return Err(VidshotError::FrameConversion {
                index,
                reason: "frame has zero dimensions".to_string(),
            });
        }

        if self.scaler.is_none() || self.source != source {
            self.scaler = Some(ScalingContext::get(
                source.0,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
            self.source = source;
        }

        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(decoded, &mut self.rgb_frame)?;
        }

        let buffer = packed_rgb(&self.rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| VidshotError::FrameConversion {
            index,
            reason: "pixel buffer does not match frame dimensions".to_string(),
        })
    }
}

/// Copy plane 0 of an RGB24 frame into a tightly packed buffer.
///
/// FFmpeg rows often carry padding (stride > width × 3); it is dropped here.
fn packed_rgb(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_length = (width as usize) * 3;
    let data = frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in data.chunks(stride).take(height as usize) {
            buffer.extend_from_slice(&row[..row_length]);
        }
        buffer
    }
}
