//! Sample frames written alongside each checkpoint.
//!
//! Names are `epoch_<EEE>_frame_<k>.png`; `k` keeps counting across
//! checkpoints so earlier samples are never overwritten.

use crate::error::Result;
use crate::media::clip_to_images;
use crate::model::VisemeGan;
use std::path::{Path, PathBuf};

/// `epoch_<EEE>_frame_<k>.png`.
pub fn sample_frame_name(epoch: usize, index: usize) -> String {
    format!("epoch_{epoch:03}_frame_{index}.png")
}

fn parse_frame_index(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(".png")?;
    if !stem.starts_with("epoch_") {
        return None;
    }
    let (_, index) = stem.rsplit_once("_frame_")?;
    index.parse().ok()
}

/// One past the highest existing sample index in `dir`, or 0.
pub fn next_frame_index(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut next = 0;
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(i) = name.to_str().and_then(parse_frame_index) {
            next = next.max(i + 1);
        }
    }
    Ok(next)
}

/// Generate one clip and save its `T` frames into `dir`.
pub fn save_sample_frames(gan: &VisemeGan, dir: &Path, epoch: usize) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let clip = gan.sample(1)?.squeeze(0)?;
    let start = next_frame_index(dir)?;

    let mut paths = Vec::new();
    for (i, frame) in clip_to_images(&clip)?.iter().enumerate() {
        let path = dir.join(sample_frame_name(epoch, start + i));
        frame.save(&path)?;
        paths.push(path);
    }
    Ok(paths)
}
