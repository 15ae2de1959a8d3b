//! Shared helpers for integration tests.

use candle_core::Device;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use visemegan::config::TrainConfig;
use visemegan::phonemes::{CmuDictionary, PronunciationSource, write_dictionary};
use visemegan::{GanShape, VisemeClass, VisemeGan, VisemeGanConfig};

/// Epoch used for checkpoints written by [`write_checkpoint`].
pub(crate) const EPOCH: usize = 1;

/// Narrow 64x64 architecture so tests train and sample quickly on CPU.
pub(crate) fn tiny_train() -> TrainConfig {
    TrainConfig {
        latent_dim: 8,
        batch_size: 2,
        epochs: 1,
        checkpoint_interval: 1,
        generator_channels: 16,
        discriminator_channels: 4,
        max_batches_per_epoch: Some(1),
        ..TrainConfig::default()
    }
}

/// A config rooted in `root` with the tiny architecture.
pub(crate) fn tiny_config(root: &Path) -> VisemeGanConfig {
    let mut config = VisemeGanConfig::default();
    config.paths.cropped_dir = root.join("frames");
    config.paths.models_root = root.join("models");
    config.paths.output_root = root.join("outputs");
    config.train = tiny_train();
    config.synth.inference_epoch = EPOCH;
    config
}

/// Load a small CMU-format dictionary written into `root`.
pub(crate) fn dictionary(root: &Path) -> Arc<dyn PronunciationSource> {
    let path = write_dictionary(
        &root.join("cmudict.dict"),
        &[
            ("cat", "K AE1 T"),
            ("dog", "D AO1 G"),
            ("awe", "AO1"),
            ("hello", "HH AH0 L OW1"),
        ],
    )
    .expect("write dictionary");
    Arc::new(CmuDictionary::load(&path).expect("load dictionary"))
}

/// Save an untrained checkpoint for `class` at [`EPOCH`].
pub(crate) fn write_checkpoint(config: &VisemeGanConfig, class: VisemeClass) -> PathBuf {
    let gan = VisemeGan::new(GanShape::from(&config.train), &Device::Cpu).expect("build gan");
    gan.save_checkpoint(&config.paths.models_root, class, EPOCH)
        .expect("save checkpoint")
        .generator
}

/// Write `clips` clips of `frames` 64x64 PNG frames each for `class`.
pub(crate) fn write_clips(config: &VisemeGanConfig, class: VisemeClass, clips: usize, frames: usize) {
    for c in 0..clips {
        let dir = config
            .paths
            .cropped_dir
            .join(class.dir_name())
            .join(format!("clip_{c:03}"));
        std::fs::create_dir_all(&dir).expect("create clip dir");
        for f in 0..frames {
            let shade = (f * 40 + c * 10) as u8;
            RgbImage::from_pixel(80, 80, Rgb([shade, 100, 255 - shade]))
                .save(dir.join(format!("{f:04}.png")))
                .expect("write frame");
        }
    }
}

/// Sorted file names in `dir`.
pub(crate) fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Whether `ffmpeg` and `ffprobe` are both on `PATH`.
pub(crate) fn has_ffmpeg() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}
