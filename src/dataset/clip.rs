//! Single-clip loading: frame decode, normalisation, temporal resampling.

use crate::error::Result;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Frame file extensions accepted in clip directories.
const FRAME_EXTENSIONS: &[&str] = &["png", "bmp"];

/// Source indices that resample a clip of `len` frames to exactly `target`.
///
/// - `len < target`: every frame, then the last index repeated.
/// - `len > target`: `target` evenly spaced indices over `[0, len - 1]`,
///   rounded to nearest (duplicates allowed).
/// - `len == target`: identity.
///
/// `len == 0` yields an empty vector; such clips are filtered out upstream.
pub fn resample_indices(len: usize, target: usize) -> Vec<usize> {
    if len == 0 || target == 0 {
        return Vec::new();
    }
    if len <= target {
        let mut idx: Vec<usize> = (0..len).collect();
        idx.resize(target, len - 1);
        return idx;
    }
    if target == 1 {
        return vec![0];
    }
    let span = (len - 1) as f64;
    let steps = (target - 1) as f64;
    (0..target)
        .map(|i| ((i as f64) * span / steps).round() as usize)
        .collect()
}

/// Resample an ordered frame list to exactly `target` frames.
pub fn resample<T: Clone>(frames: &[T], target: usize) -> Vec<T> {
    resample_indices(frames.len(), target)
        .into_iter()
        .map(|i| frames[i].clone())
        .collect()
}

/// Frame files of a clip directory, sorted by file name.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn list_frames(clip_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(clip_dir)? {
        let path = entry?.path();
        let is_frame = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if is_frame && path.is_file() {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

/// Decode one frame as RGB, resize to `height x width`, and scale to `[-1, 1]`.
///
/// Returns `height * width * 3` values in row-major HWC order.
///
/// # Errors
///
/// Returns an image error if the file cannot be decoded.
pub fn load_frame(path: &Path, height: usize, width: usize) -> Result<Vec<f32>> {
    let img = image::open(path)?;
    let rgb = img
        .resize_exact(width as u32, height as u32, FilterType::CatmullRom)
        .to_rgb8();
    Ok(rgb
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 127.5 - 1.0)
        .collect())
}

/// Load a whole clip as `target_frames * height * width * 3` values.
///
/// Unreadable frames are skipped with a warning. Returns `Ok(None)` when no
/// frame could be loaded; such clips are dropped, never zero-padded.
///
/// # Errors
///
/// Returns an I/O error if the clip directory cannot be listed.
pub fn load_clip(
    clip_dir: &Path,
    target_frames: usize,
    height: usize,
    width: usize,
) -> Result<Option<Vec<f32>>> {
    let mut frames = Vec::new();
    for path in list_frames(clip_dir)? {
        match load_frame(&path, height, width) {
            Ok(frame) => frames.push(frame),
            Err(e) => warn!("skipping unreadable frame {}: {e}", path.display()),
        }
    }
    if frames.is_empty() {
        return Ok(None);
    }

    let frame_len = height * width * 3;
    let mut clip = Vec::with_capacity(target_frames * frame_len);
    for idx in resample_indices(frames.len(), target_frames) {
        clip.extend_from_slice(&frames[idx]);
    }
    Ok(Some(clip))
}
