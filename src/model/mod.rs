//! Per-viseme 3D GAN: generator, discriminator, loss, and checkpoints.
//!
//! Tensors at the public boundary are channels-last clips `(B, T, H, W, 3)`
//! in `[-1, 1]`. Internally both networks work channels-first, as candle's
//! convolutions expect.

pub mod checkpoint;
pub mod conv3d;
pub mod discriminator;
pub mod gan;
pub mod generator;
pub mod loss;

use crate::config::TrainConfig;
use serde::{Deserialize, Serialize};

pub use checkpoint::{CheckpointMeta, CheckpointPaths, TrainedGenerator};
pub use discriminator::Discriminator;
pub use gan::{GanOptimizers, StepLosses, StepPhase, TrainStep, VisemeGan};
pub use generator::Generator;

/// Architecture hyper-parameters shared by generator and discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanShape {
    /// Latent vector size.
    pub latent_dim: usize,
    /// Frames per clip.
    pub target_frames: usize,
    /// Frame height (multiple of 8).
    pub height: usize,
    /// Frame width (multiple of 8).
    pub width: usize,
    /// Generator channels after the dense projection.
    pub generator_channels: usize,
    /// Discriminator channels of the first 3D convolution.
    pub discriminator_channels: usize,
}

impl GanShape {
    /// Spatial size after the generator's dense projection.
    pub fn base_grid(&self) -> (usize, usize) {
        (self.height / 8, self.width / 8)
    }
}

impl From<&TrainConfig> for GanShape {
    fn from(t: &TrainConfig) -> Self {
        Self {
            latent_dim: t.latent_dim,
            target_frames: t.target_frames,
            height: t.frame_height,
            width: t.frame_width,
            generator_channels: t.generator_channels,
            discriminator_channels: t.discriminator_channels,
        }
    }
}
