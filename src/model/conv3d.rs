//! 3D convolution with TensorFlow-style "same" padding.
//!
//! candle has no native 3D convolution, so each output time step is the sum
//! of 2D convolutions over the temporal kernel taps. Taps falling into the
//! temporal padding contribute zero and are skipped.

use candle_core::{IndexOp, Module, Result, Tensor};
use candle_nn::{Init, VarBuilder};

/// Cubic-kernel 3D convolution over `(B, C, T, H, W)` inputs.
#[derive(Debug, Clone)]
pub struct Conv3d {
    weight: Tensor,
    bias: Tensor,
    kernel: usize,
    stride: usize,
}

/// `(output_size, pad_before, pad_after)` for "same" padding.
pub fn same_padding(input: usize, kernel: usize, stride: usize) -> (usize, usize, usize) {
    let output = input.div_ceil(stride);
    let total = ((output.saturating_sub(1)) * stride + kernel).saturating_sub(input);
    let before = total / 2;
    (output, before, total - before)
}

impl Conv3d {
    /// Weight `(out, in, k, k, k)` and bias `(out,)` under `vb`.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        stride: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let fan_in = (in_channels * kernel * kernel * kernel) as f64;
        let bound = 1.0 / fan_in.sqrt();
        let weight = vb.get_with_hints(
            (out_channels, in_channels, kernel, kernel, kernel),
            "weight",
            candle_nn::init::DEFAULT_KAIMING_NORMAL,
        )?;
        let bias = vb.get_with_hints(
            out_channels,
            "bias",
            Init::Uniform {
                lo: -bound,
                up: bound,
            },
        )?;
        Ok(Self {
            weight,
            bias,
            kernel,
            stride,
        })
    }

    /// Output `(T', H', W')` for an input of `(T, H, W)`.
    pub fn output_dims(&self, t: usize, h: usize, w: usize) -> (usize, usize, usize) {
        (
            same_padding(t, self.kernel, self.stride).0,
            same_padding(h, self.kernel, self.stride).0,
            same_padding(w, self.kernel, self.stride).0,
        )
    }
}

impl Module for Conv3d {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (batch, _, t_in, h_in, w_in) = xs.dims5()?;
        let out_channels = self.bias.dim(0)?;
        let (t_out, t_before, _) = same_padding(t_in, self.kernel, self.stride);
        let (h_out, h_before, h_after) = same_padding(h_in, self.kernel, self.stride);
        let (w_out, w_before, w_after) = same_padding(w_in, self.kernel, self.stride);

        let padded = xs
            .pad_with_zeros(3, h_before, h_after)?
            .pad_with_zeros(4, w_before, w_after)?;

        let mut steps = Vec::with_capacity(t_out);
        for to in 0..t_out {
            let mut acc: Option<Tensor> = None;
            for kt in 0..self.kernel {
                let ti = (to * self.stride + kt) as isize - t_before as isize;
                if ti < 0 || ti >= t_in as isize {
                    continue;
                }
                let frame = padded.i((.., .., ti as usize))?.contiguous()?;
                let taps = self.weight.i((.., .., kt))?.contiguous()?;
                let y = frame.conv2d(&taps, 0, self.stride, 1, 1)?;
                acc = Some(match acc {
                    Some(a) => (a + y)?,
                    None => y,
                });
            }
            let step = match acc {
                Some(a) => a,
                None => Tensor::zeros(
                    (batch, out_channels, h_out, w_out),
                    xs.dtype(),
                    xs.device(),
                )?,
            };
            steps.push(step);
        }

        let ys = Tensor::stack(&steps, 2)?;
        ys.broadcast_add(&self.bias.reshape((1, out_channels, 1, 1, 1))?)
    }
}
