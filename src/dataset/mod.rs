//! Per-class clip dataset: lazy loading, bounded shuffle, batching.
//!
//! Layout: `<root>/<class>/<clip>/<frame>.png`. Each epoch walks the clip
//! directories lazily, drops clips with no loadable frames, shuffles through a
//! bounded buffer, and yields `(B, T, H, W, 3)` tensors in `[-1, 1]`.

pub mod clip;

use crate::config::TrainConfig;
use crate::error::{Result, VisemeGanError};
use crate::viseme::VisemeClass;
use candle_core::{Device, Tensor};
use rand::Rng;
use std::path::PathBuf;
use tracing::{debug, warn};

pub use clip::{load_clip, load_frame, resample, resample_indices};

/// Clips of one viseme class.
pub struct ClipDataset {
    class: VisemeClass,
    clip_dirs: Vec<PathBuf>,
    target_frames: usize,
    height: usize,
    width: usize,
    batch_size: usize,
    shuffle_buffer: usize,
    device: Device,
}

impl ClipDataset {
    /// Index the clip directories of `class` under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`VisemeGanError::Dataset`] if the class directory is missing or
    /// has no clip sub-directories.
    pub fn open(
        root: &std::path::Path,
        class: VisemeClass,
        train: &TrainConfig,
        device: &Device,
    ) -> Result<Self> {
        let class_dir = root.join(class.dir_name());
        if !class_dir.is_dir() {
            return Err(VisemeGanError::Dataset(format!(
                "{} not found",
                class_dir.display()
            )));
        }

        let mut clip_dirs = Vec::new();
        for entry in std::fs::read_dir(&class_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                clip_dirs.push(path);
            }
        }
        clip_dirs.sort();

        if clip_dirs.is_empty() {
            return Err(VisemeGanError::Dataset(format!(
                "{} has no clip directories",
                class_dir.display()
            )));
        }
        debug!("{class}: {} clip directories", clip_dirs.len());

        Ok(Self {
            class,
            clip_dirs,
            target_frames: train.target_frames,
            height: train.frame_height,
            width: train.frame_width,
            batch_size: train.batch_size,
            shuffle_buffer: train.shuffle_buffer,
            device: device.clone(),
        })
    }

    /// Viseme class of this dataset.
    pub fn class(&self) -> VisemeClass {
        self.class
    }

    /// Number of clip directories (before filtering empty clips).
    pub fn clip_dir_count(&self) -> usize {
        self.clip_dirs.len()
    }

    /// One shuffled pass over the dataset.
    pub fn epoch<'a, R: Rng>(&'a self, rng: &'a mut R) -> Batches<'a, R> {
        let clips = LoadedClips {
            dataset: self,
            next: 0,
        };
        Batches {
            dataset: self,
            clips: Shuffled::new(clips, self.shuffle_buffer, rng),
        }
    }

    fn clip_shape(&self) -> (usize, usize, usize, usize) {
        (self.target_frames, self.height, self.width, 3)
    }
}

/// Lazily loads clips in directory order, skipping empty/unreadable ones.
struct LoadedClips<'a> {
    dataset: &'a ClipDataset,
    next: usize,
}

impl Iterator for LoadedClips<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        let ds = self.dataset;
        while let Some(dir) = ds.clip_dirs.get(self.next) {
            self.next += 1;
            match load_clip(dir, ds.target_frames, ds.height, ds.width) {
                Ok(Some(clip)) => return Some(clip),
                Ok(None) => warn!("skipping clip with no loadable frames: {}", dir.display()),
                Err(e) => warn!("skipping unreadable clip {}: {e}", dir.display()),
            }
        }
        None
    }
}

/// Bounded-buffer shuffle.
///
/// Keeps up to `capacity` items; each `next` draws a uniformly random item from
/// the buffer and refills from the source. Only a full-dataset buffer gives a
/// uniform permutation.
pub struct Shuffled<I: Iterator, R> {
    source: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: R,
}

impl<I: Iterator, R: Rng> Shuffled<I, R> {
    /// Wrap `source` with a buffer of `capacity` (at least 1).
    pub fn new(source: I, capacity: usize, rng: R) -> Self {
        let capacity = capacity.max(1);
        Self {
            source,
            buffer: Vec::with_capacity(capacity),
            capacity,
            rng,
        }
    }
}

impl<I: Iterator, R: Rng> Iterator for Shuffled<I, R> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.capacity {
            match self.source.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }
        if self.buffer.is_empty() {
            return None;
        }
        let i = self.rng.gen_range(0..self.buffer.len());
        Some(self.buffer.swap_remove(i))
    }
}

/// Mini-batches of one epoch. The final batch may be smaller than `batch_size`.
pub struct Batches<'a, R: Rng> {
    dataset: &'a ClipDataset,
    clips: Shuffled<LoadedClips<'a>, &'a mut R>,
}

impl<R: Rng> Iterator for Batches<'_, R> {
    type Item = Result<Tensor>;

    fn next(&mut self) -> Option<Self::Item> {
        let ds = self.dataset;
        let mut flat = Vec::new();
        let mut n = 0;
        while n < ds.batch_size {
            match self.clips.next() {
                Some(clip) => {
                    flat.extend(clip);
                    n += 1;
                }
                None => break,
            }
        }
        if n == 0 {
            return None;
        }
        let (t, h, w, c) = ds.clip_shape();
        Some(Tensor::from_vec(flat, (n, t, h, w, c), &ds.device).map_err(Into::into))
    }
}
