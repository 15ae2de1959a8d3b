//! Preview grid of cropped training frames.
//!
//! One row per class directory (sorted by name), up to `samples` tiles per
//! row, taken from the class's clips in sorted order.

use crate::dataset::clip::list_frames;
use crate::error::{Result, VisemeGanError};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A composed grid plus the class name and tile count of each row.
pub struct PreviewGrid {
    pub image: RgbImage,
    pub rows: Vec<(String, usize)>,
}

fn sorted_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// First `samples` readable frames of a class, in clip then frame order.
fn class_tiles(class_dir: &Path, samples: usize, tile: u32) -> Result<Vec<RgbImage>> {
    let mut tiles = Vec::with_capacity(samples);
    'clips: for clip in sorted_dirs(class_dir)? {
        for frame in list_frames(&clip)? {
            match image::open(&frame) {
                Ok(img) => tiles.push(img.resize_exact(tile, tile, FilterType::Nearest).to_rgb8()),
                Err(e) => warn!("skipping unreadable frame {}: {e}", frame.display()),
            }
            if tiles.len() >= samples {
                break 'clips;
            }
        }
    }
    Ok(tiles)
}

/// Compose the grid for every class directory under `cropped_root`.
///
/// # Errors
///
/// [`VisemeGanError::Dataset`] if `cropped_root` holds no class directories.
pub fn build_grid(cropped_root: &Path, samples: usize, tile: u32) -> Result<PreviewGrid> {
    if !cropped_root.is_dir() {
        return Err(VisemeGanError::Dataset(format!(
            "{} not found",
            cropped_root.display()
        )));
    }
    let classes = sorted_dirs(cropped_root)?;
    if classes.is_empty() {
        return Err(VisemeGanError::Dataset(format!(
            "no classes found in {}",
            cropped_root.display()
        )));
    }

    let cols = samples.max(1) as u32;
    let mut image = RgbImage::from_pixel(cols * tile, classes.len() as u32 * tile, Rgb([0, 0, 0]));
    let mut rows = Vec::with_capacity(classes.len());

    for (row, class_dir) in classes.iter().enumerate() {
        let tiles = class_tiles(class_dir, samples, tile)?;
        let y = i64::from(row as u32 * tile);
        for (col, t) in tiles.iter().enumerate() {
            imageops::replace(&mut image, t, i64::from(col as u32 * tile), y);
        }
        let name = class_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        rows.push((name, tiles.len()));
    }

    Ok(PreviewGrid { image, rows })
}

/// Build the grid and save it as a PNG at `out`.
pub fn save_grid(cropped_root: &Path, samples: usize, tile: u32, out: &Path) -> Result<PreviewGrid> {
    let grid = build_grid(cropped_root, samples, tile)?;
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    grid.image.save(out)?;
    info!("preview saved to {}", out.display());
    Ok(grid)
}
