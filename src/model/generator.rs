//! Latent vector to short RGB clip.
//!
//! Dense projection to a `T x H/8 x W/8 x C` volume, then three
//! stride-2 spatial up-convolutions applied per frame. The temporal axis is
//! never mixed: the network's temporal kernel has size 1, so each stage is a
//! 2D transposed convolution over the `B * T` frames.

use super::GanShape;
use candle_core::{Module, ModuleT, Result, Tensor};
use candle_nn::{
    BatchNorm, BatchNormConfig, ConvTranspose2d, ConvTranspose2dConfig, Linear, VarBuilder,
};

const KERNEL: usize = 4;

fn upsample_config() -> ConvTranspose2dConfig {
    ConvTranspose2dConfig {
        padding: 1,
        output_padding: 0,
        stride: 2,
        dilation: 1,
    }
}

fn norm_config() -> BatchNormConfig {
    BatchNormConfig {
        eps: 1e-3,
        remove_mean: true,
        affine: true,
        momentum: 0.01,
    }
}

/// Clip generator.
#[derive(Debug, Clone)]
pub struct Generator {
    shape: GanShape,
    project: Linear,
    up1: ConvTranspose2d,
    norm1: BatchNorm,
    up2: ConvTranspose2d,
    norm2: BatchNorm,
    up3: ConvTranspose2d,
}

impl Generator {
    /// Build the layers under `vb`.
    pub fn new(shape: GanShape, vb: VarBuilder) -> Result<Self> {
        let c = shape.generator_channels;
        let (h0, w0) = shape.base_grid();
        let projected = shape.target_frames * h0 * w0 * c;
        let cfg = upsample_config();

        Ok(Self {
            shape,
            project: candle_nn::linear(shape.latent_dim, projected, vb.pp("project"))?,
            up1: candle_nn::conv_transpose2d(c, c / 2, KERNEL, cfg, vb.pp("up1"))?,
            norm1: candle_nn::batch_norm(c / 2, norm_config(), vb.pp("norm1"))?,
            up2: candle_nn::conv_transpose2d(c / 2, c / 4, KERNEL, cfg, vb.pp("up2"))?,
            norm2: candle_nn::batch_norm(c / 4, norm_config(), vb.pp("norm2"))?,
            up3: candle_nn::conv_transpose2d(c / 4, 3, KERNEL, cfg, vb.pp("up3"))?,
        })
    }

    /// Architecture of this generator.
    pub fn shape(&self) -> GanShape {
        self.shape
    }

    /// Map latents `(B, latent_dim)` to clips `(B, T, H, W, 3)` in `[-1, 1]`.
    ///
    /// `train` selects batch statistics (and running-stat updates) in the
    /// normalisation layers.
    pub fn forward_t(&self, z: &Tensor, train: bool) -> Result<Tensor> {
        let b = z.dim(0)?;
        let t = self.shape.target_frames;
        let c = self.shape.generator_channels;
        let (h0, w0) = self.shape.base_grid();

        let xs = self.project.forward(z)?;
        let xs = xs
            .reshape((b * t, h0, w0, c))?
            .permute((0, 3, 1, 2))?
            .contiguous()?;

        let xs = self.up1.forward(&xs)?;
        let xs = self.norm1.forward_t(&xs, train)?.relu()?;
        let xs = self.up2.forward(&xs)?;
        let xs = self.norm2.forward_t(&xs, train)?.relu()?;
        let xs = self.up3.forward(&xs)?.tanh()?;

        xs.reshape((b, t, 3, self.shape.height, self.shape.width))?
            .permute((0, 1, 3, 4, 2))?
            .contiguous()
    }
}
