//! Looping GIF encoding.

use crate::error::{Result, VisemeGanError};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, DynamicImage, Frame, RgbImage};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Encode `frames` as an infinitely looping GIF, `frame_ms` per frame.
///
/// # Errors
///
/// [`VisemeGanError::Encode`] for an empty frame list; image or I/O errors
/// from the encoder.
pub fn encode_gif(frames: &[RgbImage], path: &Path, frame_ms: u32) -> Result<()> {
    if frames.is_empty() {
        return Err(VisemeGanError::Encode("no frames to encode".into()));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new_with_speed(writer, 10);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(frame_ms, 1);
    encoder.encode_frames(frames.iter().map(|f| {
        let rgba = DynamicImage::ImageRgb8(f.clone()).to_rgba8();
        Frame::from_parts(rgba, 0, 0, delay)
    }))?;
    Ok(())
}

/// Number of frames stored in a GIF file.
pub fn gif_frame_count(path: &Path) -> Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader)?;
    Ok(decoder.into_frames().collect_frames()?.len())
}
