//! Clip realness scorer.
//!
//! Two stride-2 3D convolutions (kernel 4, "same" padding), each followed by
//! leaky ReLU (slope 0.2) and dropout (0.3), then a dense layer to a single
//! logit.

use super::GanShape;
use super::conv3d::Conv3d;
use candle_core::{Module, ModuleT, Result, Tensor};
use candle_nn::{Dropout, Linear, VarBuilder};

const KERNEL: usize = 4;
const STRIDE: usize = 2;
const LEAKY_SLOPE: f64 = 0.2;
const DROPOUT: f32 = 0.3;

fn leaky_relu(xs: &Tensor) -> Result<Tensor> {
    xs.maximum(&(xs * LEAKY_SLOPE)?)
}

/// Clip discriminator.
#[derive(Debug, Clone)]
pub struct Discriminator {
    conv1: Conv3d,
    conv2: Conv3d,
    dropout: Dropout,
    head: Linear,
}

impl Discriminator {
    /// Build the layers under `vb`.
    pub fn new(shape: GanShape, vb: VarBuilder) -> Result<Self> {
        let c = shape.discriminator_channels;
        let conv1 = Conv3d::new(3, c, KERNEL, STRIDE, vb.pp("conv1"))?;
        let conv2 = Conv3d::new(c, 2 * c, KERNEL, STRIDE, vb.pp("conv2"))?;

        let (t1, h1, w1) = conv1.output_dims(shape.target_frames, shape.height, shape.width);
        let (t2, h2, w2) = conv2.output_dims(t1, h1, w1);
        let flat = 2 * c * t2 * h2 * w2;

        Ok(Self {
            conv1,
            conv2,
            dropout: Dropout::new(DROPOUT),
            head: candle_nn::linear(flat, 1, vb.pp("head"))?,
        })
    }

    /// Logits `(B, 1)` for clips `(B, T, H, W, 3)`.
    ///
    /// Dropout is active only when `train` is set.
    pub fn forward_t(&self, clips: &Tensor, train: bool) -> Result<Tensor> {
        let xs = clips.permute((0, 4, 1, 2, 3))?.contiguous()?;
        let xs = leaky_relu(&self.conv1.forward(&xs)?)?;
        let xs = self.dropout.forward_t(&xs, train)?;
        let xs = leaky_relu(&self.conv2.forward(&xs)?)?;
        let xs = self.dropout.forward_t(&xs, train)?;
        self.head.forward(&xs.flatten_from(1)?)
    }

    /// Realness probability `(B, 1)` in `(0, 1)`, inference mode.
    pub fn score(&self, clips: &Tensor) -> Result<Tensor> {
        candle_nn::ops::sigmoid(&self.forward_t(clips, false)?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::model::test_support::tiny_shape;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn one_logit_per_clip() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let disc = Discriminator::new(tiny_shape(), vb).unwrap();
        let clips = Tensor::randn(0f32, 0.5f32, (3, 3, 64, 64, 3), &Device::Cpu).unwrap();
        assert_eq!(disc.forward_t(&clips, true).unwrap().dims(), &[3, 1]);
    }

    #[test]
    fn score_is_a_probability() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let disc = Discriminator::new(tiny_shape(), vb).unwrap();
        let clips = Tensor::randn(0f32, 0.5f32, (2, 3, 64, 64, 3), &Device::Cpu).unwrap();
        let scores = disc.score(&clips).unwrap().flatten_all().unwrap();
        for s in scores.to_vec1::<f32>().unwrap() {
            assert!(s > 0.0 && s < 1.0);
        }
    }

    #[test]
    fn inference_is_deterministic() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let disc = Discriminator::new(tiny_shape(), vb).unwrap();
        let clips = Tensor::randn(0f32, 0.5f32, (1, 3, 64, 64, 3), &Device::Cpu).unwrap();
        let a = disc.forward_t(&clips, false).unwrap().to_vec2::<f32>().unwrap();
        let b = disc.forward_t(&clips, false).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn leaky_relu_scales_negatives() {
        let xs = Tensor::new(&[-1.0f32, 0.0, 2.0], &Device::Cpu).unwrap();
        let ys = leaky_relu(&xs).unwrap().to_vec1::<f32>().unwrap();
        assert!((ys[0] + 0.2).abs() < 1e-6);
        assert_eq!(ys[1], 0.0);
        assert_eq!(ys[2], 2.0);
    }
}
