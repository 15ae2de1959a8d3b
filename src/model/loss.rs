//! Binary cross-entropy on discriminator logits.

use candle_core::{Result, Tensor};

/// `log(1 + e^x)` without overflow.
pub fn softplus(xs: &Tensor) -> Result<Tensor> {
    let tail = (xs.abs()?.neg()?.exp()? + 1.0)?.log()?;
    xs.relu()? + tail
}

/// Mean BCE between `sigmoid(logits)` and a constant `target` label.
///
/// Equal to `softplus(x) - target * x`, which stays finite for saturated
/// logits where the probability form would take `log(0)`.
pub fn bce_with_logits(logits: &Tensor, target: f64) -> Result<Tensor> {
    (softplus(logits)? - (logits * target)?)?.mean_all()
}

/// Discriminator loss: real clips labelled 1, generated clips labelled 0.
pub fn discriminator_loss(real_logits: &Tensor, fake_logits: &Tensor) -> Result<Tensor> {
    bce_with_logits(real_logits, 1.0)? + bce_with_logits(fake_logits, 0.0)?
}

/// Generator loss: generated clips labelled 1.
pub fn generator_loss(fake_logits: &Tensor) -> Result<Tensor> {
    bce_with_logits(fake_logits, 1.0)
}
