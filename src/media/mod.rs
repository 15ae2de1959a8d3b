//! Frame export and animation encoding.
//!
//! Generated frames are `(H, W, 3)` tensors in `[-1, 1]`; they are written as
//! numbered PNGs, then assembled into a looping GIF and an MP4.

pub mod ffmpeg;
pub mod gif;

use crate::error::{Result, VisemeGanError};
use candle_core::Tensor;
use image::RgbImage;
use std::path::{Path, PathBuf};

pub use ffmpeg::Ffmpeg;
pub use gif::{encode_gif, gif_frame_count};

/// `[-1, 1]` to `[0, 255]`. Out-of-range values are clamped; NaN maps to 0.
pub fn denormalize(value: f32) -> u8 {
    ((value + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

/// Convert one `(H, W, 3)` frame to an 8-bit image.
pub fn frame_to_image(frame: &Tensor) -> Result<RgbImage> {
    let (h, w, c) = frame.dims3()?;
    if c != 3 {
        return Err(VisemeGanError::Encode(format!(
            "expected 3 colour channels, got {c}"
        )));
    }
    let pixels: Vec<u8> = frame
        .flatten_all()?
        .to_vec1::<f32>()?
        .into_iter()
        .map(denormalize)
        .collect();
    RgbImage::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| VisemeGanError::Encode(format!("frame buffer does not fit {w}x{h}")))
}

/// Convert a `(T, H, W, 3)` clip to `T` images.
pub fn clip_to_images(clip: &Tensor) -> Result<Vec<RgbImage>> {
    let frames = clip.dim(0)?;
    (0..frames)
        .map(|t| frame_to_image(&clip.get(t)?))
        .collect()
}

/// `<word>_<NN>.png`, 1-based, at least two digits.
pub fn frame_file_name(word: &str, index: usize) -> String {
    format!("{word}_{index:02}.png")
}

/// File-system and `ffmpeg` pattern safe stem for `word`.
///
/// Anything but ASCII alphanumerics, `_`, `-` and `'` becomes `_`, so separators,
/// `.` and `%` never reach a path or an image-sequence pattern.
pub fn output_stem(word: &str) -> String {
    word.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '\'') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether `file_name` is `<word>_<digits>.png`.
fn is_frame_file(file_name: &str, word: &str) -> bool {
    file_name
        .strip_prefix(word)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Remove `<word>_<NN>.png` files left in `dir` by an earlier run.
pub fn clear_frames(dir: &Path, word: &str) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if is_frame_file(&entry.file_name().to_string_lossy(), word) {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Write `frames` into `dir` as `<word>_01.png`, `<word>_02.png`, ...
///
/// Earlier frames of the same word are removed first, so the directory holds
/// exactly `frames.len()` of them.
pub fn write_frames(dir: &Path, word: &str, frames: &[RgbImage]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    clear_frames(dir, word)?;
    let mut paths = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        let path = dir.join(frame_file_name(word, i + 1));
        frame.save(&path)?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use candle_core::Device;

    #[test]
    fn denormalize_maps_range_ends() {
        assert_eq!(denormalize(-1.0), 0);
        assert_eq!(denormalize(1.0), 255);
        assert_eq!(denormalize(0.0), 128);
        assert_eq!(denormalize(3.0), 255);
        assert_eq!(denormalize(-3.0), 0);
        assert_eq!(denormalize(f32::NAN), 0);
    }

    #[test]
    fn file_names_are_one_based_and_padded() {
        assert_eq!(frame_file_name("cat", 1), "cat_01.png");
        assert_eq!(frame_file_name("cat", 12), "cat_12.png");
        assert_eq!(frame_file_name("cat", 123), "cat_123.png");
    }

    #[test]
    fn clip_converts_to_images() {
        let clip = Tensor::ones((2, 4, 6, 3), candle_core::DType::F32, &Device::Cpu).unwrap();
        let images = clip_to_images(&clip).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].dimensions(), (6, 4));
        assert!(images[1].pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn non_rgb_frame_is_rejected() {
        let frame = Tensor::zeros((4, 4, 1), candle_core::DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            frame_to_image(&frame),
            Err(VisemeGanError::Encode(_))
        ));
    }

    #[test]
    fn frames_are_written_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let frames = vec![RgbImage::new(4, 4); 3];
        let paths = write_frames(&dir.path().join("cat"), "cat", &frames).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["cat_01.png", "cat_02.png", "cat_03.png"]);
        assert!(paths.iter().all(|p| p.is_file()));
    }

    #[test]
    fn rewriting_fewer_frames_drops_stale_ones() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("cat");
        write_frames(&frames_dir, "cat", &vec![RgbImage::new(4, 4); 7]).unwrap();
        std::fs::write(frames_dir.join("cats_01.png"), b"other word").unwrap();
        std::fs::write(frames_dir.join("notes.txt"), b"keep").unwrap();

        write_frames(&frames_dir, "cat", &vec![RgbImage::new(4, 4); 5]).unwrap();
        let mut names: Vec<_> = std::fs::read_dir(&frames_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "cat_01.png",
                "cat_02.png",
                "cat_03.png",
                "cat_04.png",
                "cat_05.png",
                "cats_01.png",
                "notes.txt"
            ]
        );
    }

    #[test]
    fn frame_file_matching_is_exact() {
        assert!(is_frame_file("cat_01.png", "cat"));
        assert!(is_frame_file("cat_123.png", "cat"));
        assert!(!is_frame_file("cat_.png", "cat"));
        assert!(!is_frame_file("cat_01.gif", "cat"));
        assert!(!is_frame_file("cats_01.png", "cat"));
        assert!(!is_frame_file("cat_0a.png", "cat"));
    }

    #[test]
    fn output_stem_neutralises_paths_and_patterns() {
        assert_eq!(output_stem("cat"), "cat");
        assert_eq!(output_stem("don't"), "don't");
        assert_eq!(output_stem("%percent"), "_percent");
        assert_eq!(output_stem("/etc/passwd"), "_etc_passwd");
        assert_eq!(output_stem("../up"), "___up");
        assert_eq!(output_stem("a\\b"), "a_b");
    }

    #[test]
    fn clearing_a_missing_directory_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(clear_frames(&dir.path().join("absent"), "cat").unwrap(), 0);
    }
}
