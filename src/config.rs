//! Configuration types for training and word synthesis.

use crate::error::{Result, VisemeGanError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisemeGanConfig {
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// Model shape and training hyper-parameters.
    pub train: TrainConfig,
    /// Word synthesis settings.
    pub synth: SynthConfig,
    /// Preview grid settings.
    pub viz: VizConfig,
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of cropped mouth frames: `<root>/<class>/<clip>/<frame>.png`.
    pub cropped_dir: PathBuf,
    /// Root of per-class checkpoints: `<root>/<class>/generator_epoch_<N>.*`.
    pub models_root: PathBuf,
    /// Root for generated word animations.
    pub output_root: PathBuf,
    /// CMU pronouncing dictionary file (None = probe default locations).
    pub dictionary: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cropped_dir: PathBuf::from("data/cropped_frames"),
            models_root: PathBuf::from("saved_gans"),
            output_root: PathBuf::from("outputs"),
            dictionary: None,
        }
    }
}

/// Model shape and training hyper-parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Frames per clip (`T`).
    pub target_frames: usize,
    /// Frame height in pixels. Must be a multiple of 8.
    pub frame_height: usize,
    /// Frame width in pixels. Must be a multiple of 8.
    pub frame_width: usize,
    /// Latent vector size (`Z`).
    pub latent_dim: usize,
    /// Clips per mini-batch.
    pub batch_size: usize,
    /// Number of epochs per viseme class.
    pub epochs: usize,
    /// Adam learning rate for both networks.
    pub learning_rate: f64,
    /// Save a sample clip and weights every this many epochs.
    pub checkpoint_interval: usize,
    /// Capacity of the bounded shuffle buffer.
    ///
    /// Batch composition depends on this value; results are reproducible only
    /// in distribution, not bit-for-bit.
    pub shuffle_buffer: usize,
    /// Seed for the shuffle RNG.
    pub seed: u64,
    /// Stop each epoch after this many batches (debug runs).
    pub max_batches_per_epoch: Option<usize>,
    /// Stop training a class when a loss turns NaN/inf (otherwise just warn).
    pub halt_on_divergence: bool,
    /// Channel width after the generator's dense projection. Must be divisible by 4.
    pub generator_channels: usize,
    /// Channel width of the discriminator's first convolution.
    pub discriminator_channels: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            target_frames: 3,
            frame_height: 64,
            frame_width: 64,
            latent_dim: 100,
            batch_size: 16,
            epochs: 100,
            learning_rate: 1e-4,
            checkpoint_interval: 10,
            shuffle_buffer: 100,
            seed: 42,
            max_batches_per_epoch: None,
            halt_on_divergence: true,
            generator_channels: 256,
            discriminator_channels: 64,
        }
    }
}

/// How the synthesizer turns a generator into per-phoneme frames.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// One fresh latent per output frame; the first frame of each sampled clip is kept.
    #[default]
    PerFrame,
    /// One latent per phoneme; the native `T`-frame clip is resampled to the frame count.
    PerPhonemeClip,
}

/// Word synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Checkpoint epoch to load for every viseme class.
    pub inference_epoch: usize,
    /// Output frame rate, used for frame counts and the MP4.
    pub fps: u32,
    /// Display time of each GIF frame in milliseconds.
    pub gif_frame_ms: u32,
    /// Base phoneme duration in seconds (vowels get 1.5x).
    pub base_duration_secs: f64,
    /// Per-phoneme sampling strategy.
    pub sampling: SamplingMode,
    /// Explicit `ffmpeg` binary (None = search `PATH`).
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            inference_epoch: 100,
            fps: 25,
            gif_frame_ms: 40,
            base_duration_secs: 0.1,
            sampling: SamplingMode::PerFrame,
            ffmpeg_path: None,
        }
    }
}

/// Preview grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Frames shown per viseme class row.
    pub samples_per_class: usize,
    /// Edge length of each grid tile in pixels.
    pub tile_size: u32,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            samples_per_class: 5,
            tile_size: 64,
        }
    }
}

impl VisemeGanConfig {
    /// Load configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or fails
    /// [`Self::validate`].
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VisemeGanError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|e| VisemeGanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VisemeGanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges that would otherwise fail deep inside training.
    ///
    /// # Errors
    ///
    /// Returns [`VisemeGanError::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let t = &self.train;
        let fail = |msg: &str| Err(VisemeGanError::Config(msg.to_owned()));

        if t.target_frames == 0 {
            return fail("train.target_frames must be at least 1");
        }
        if t.frame_height == 0 || t.frame_height % 8 != 0 {
            return fail("train.frame_height must be a positive multiple of 8");
        }
        if t.frame_width == 0 || t.frame_width % 8 != 0 {
            return fail("train.frame_width must be a positive multiple of 8");
        }
        if t.latent_dim == 0 {
            return fail("train.latent_dim must be at least 1");
        }
        if t.batch_size == 0 {
            return fail("train.batch_size must be at least 1");
        }
        if t.epochs == 0 {
            return fail("train.epochs must be at least 1");
        }
        if !(t.learning_rate.is_finite() && t.learning_rate > 0.0) {
            return fail("train.learning_rate must be positive");
        }
        if t.checkpoint_interval == 0 {
            return fail("train.checkpoint_interval must be at least 1");
        }
        if t.shuffle_buffer == 0 {
            return fail("train.shuffle_buffer must be at least 1");
        }
        if t.generator_channels < 4 || t.generator_channels % 4 != 0 {
            return fail("train.generator_channels must be a positive multiple of 4");
        }
        if t.discriminator_channels == 0 {
            return fail("train.discriminator_channels must be at least 1");
        }
        if self.synth.fps == 0 {
            return fail("synth.fps must be at least 1");
        }
        if self.synth.gif_frame_ms == 0 {
            return fail("synth.gif_frame_ms must be at least 1");
        }
        if !(self.synth.base_duration_secs.is_finite() && self.synth.base_duration_secs > 0.0) {
            return fail("synth.base_duration_secs must be positive");
        }
        if self.viz.samples_per_class == 0 || self.viz.tile_size == 0 {
            return fail("viz.samples_per_class and viz.tile_size must be at least 1");
        }
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/visemegan/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::dirs::config_file()
    }
}
