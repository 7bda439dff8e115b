//! Synthetic test videos, encoded with FFmpeg at test time.
//!
//! MPEG-4 Part 2 in AVI is used because both the encoder and the muxer are
//! built into every FFmpeg build and need no global header.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational, codec::Id, codec::context::Context as CodecContext, format::Pixel,
    frame::Video as VideoFrame,
};

/// Encode `frame_count` frames of a moving gradient at `fps` into `path`.
pub fn encode_video(path: &Path, width: u32, height: u32, fps: i32, frame_count: u32) {
    ffmpeg_next::init().expect("Failed to initialise FFmpeg");
    ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);

    let time_base = Rational::new(1, fps);
    let mut output = ffmpeg_next::format::output(&path).expect("Failed to create output");
    let codec = ffmpeg_next::encoder::find(Id::MPEG4).expect("MPEG-4 encoder not available");

    let mut stream = output.add_stream(codec).expect("Failed to add stream");
    let stream_index = stream.index();

    let mut encoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.encoder().video())
        .expect("Failed to create encoder");
    encoder.set_width(width);
    encoder.set_height(height);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base(time_base);
    encoder.set_frame_rate(Some(Rational::new(fps, 1)));
    encoder.set_bit_rate(400_000);

    let mut encoder = encoder.open_as(codec).expect("Failed to open encoder");
    stream.set_parameters(&encoder);
    stream.set_time_base(time_base);
    output.write_header().expect("Failed to write header");

    let stream_time_base = output
        .stream(stream_index)
        .expect("Stream disappeared")
        .time_base();

    let mut packet = Packet::empty();
    for index in 0..frame_count {
        let mut frame = VideoFrame::new(Pixel::YUV420P, width, height);
        paint(&mut frame, index);
        frame.set_pts(Some(i64::from(index)));
        encoder.send_frame(&frame).expect("Failed to send frame");

        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(stream_index);
            packet.rescale_ts(time_base, stream_time_base);
            packet
                .write_interleaved(&mut output)
                .expect("Failed to write packet");
        }
    }

    encoder.send_eof().expect("Failed to flush encoder");
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(time_base, stream_time_base);
        packet
            .write_interleaved(&mut output)
            .expect("Failed to write packet");
    }
    output.write_trailer().expect("Failed to write trailer");
}

/// Write a video into `directory` and return its path.
pub fn video_in(directory: &Path, name: &str, seconds: u32, fps: i32) -> PathBuf {
    let path = directory.join(name);
    encode_video(&path, 160, 120, fps, seconds * fps as u32);
    path
}

fn paint(frame: &mut VideoFrame, index: u32) {
    let (width, height) = (frame.width() as usize, frame.height() as usize);

    let luma_stride = frame.stride(0);
    let luma = frame.data_mut(0);
    for y in 0..height {
        for x in 0..width {
            luma[y * luma_stride + x] = ((x + y + index as usize * 3) % 256) as u8;
        }
    }

    for plane in 1..3 {
        let stride = frame.stride(plane);
        let data = frame.data_mut(plane);
        for y in 0..height / 2 {
            for x in 0..width / 2 {
                data[y * stride + x] = (128 + (index as usize % 64) * plane) as u8;
            }
        }
    }
}
