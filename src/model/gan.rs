//! Generator/discriminator pair and the adversarial training step.
//!
//! A step is two explicit phases over one latent batch:
//!
//! 1. [`StepPhase::Discriminator`]: score real clips and detached generated
//!    clips, update only the discriminator.
//! 2. [`StepPhase::Generator`]: regenerate from the same latents, score, and
//!    update only the generator.
//!
//! Each phase is callable on its own so tests can inject the batch and the
//! latents.

use super::loss::{discriminator_loss, generator_loss};
use super::{Discriminator, GanShape, Generator};
use crate::error::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use tracing::trace;

/// Generator and discriminator with their variable stores.
pub struct VisemeGan {
    shape: GanShape,
    device: Device,
    gen_vars: VarMap,
    disc_vars: VarMap,
    generator: Generator,
    discriminator: Discriminator,
}

impl VisemeGan {
    /// Freshly initialised pair.
    pub fn new(shape: GanShape, device: &Device) -> Result<Self> {
        let gen_vars = VarMap::new();
        let disc_vars = VarMap::new();
        let generator = Generator::new(
            shape,
            VarBuilder::from_varmap(&gen_vars, DType::F32, device),
        )?;
        let discriminator = Discriminator::new(
            shape,
            VarBuilder::from_varmap(&disc_vars, DType::F32, device),
        )?;
        Ok(Self {
            shape,
            device: device.clone(),
            gen_vars,
            disc_vars,
            generator,
            discriminator,
        })
    }

    pub fn shape(&self) -> GanShape {
        self.shape
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    pub fn generator_vars(&self) -> &VarMap {
        &self.gen_vars
    }

    pub fn discriminator_vars(&self) -> &VarMap {
        &self.disc_vars
    }

    /// Standard-normal latents `(n, latent_dim)` from the device RNG.
    ///
    /// Only reproducible on backends that accept `Device::set_seed`.
    pub fn sample_latent(&self, n: usize) -> Result<Tensor> {
        Ok(Tensor::randn(
            0f32,
            1f32,
            (n, self.shape.latent_dim),
            &self.device,
        )?)
    }

    /// Inference-mode clips `(n, T, H, W, 3)` from fresh latents.
    pub fn sample(&self, n: usize) -> Result<Tensor> {
        let z = self.sample_latent(n)?;
        Ok(self.generator.forward_t(&z, false)?)
    }

    /// Discriminator phase: returns `L_D` after updating the discriminator.
    pub fn discriminator_phase(
        &self,
        optimizers: &mut GanOptimizers,
        real: &Tensor,
        latent: &Tensor,
    ) -> Result<f32> {
        let fake = self.generator.forward_t(latent, true)?.detach();
        let real_logits = self.discriminator.forward_t(real, true)?;
        let fake_logits = self.discriminator.forward_t(&fake, true)?;
        let loss = discriminator_loss(&real_logits, &fake_logits)?;
        optimizers.discriminator.backward_step(&loss)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    /// Generator phase: returns `L_G` after updating the generator.
    pub fn generator_phase(&self, optimizers: &mut GanOptimizers, latent: &Tensor) -> Result<f32> {
        let fake = self.generator.forward_t(latent, true)?;
        let fake_logits = self.discriminator.forward_t(&fake, true)?;
        let loss = generator_loss(&fake_logits)?;
        optimizers.generator.backward_step(&loss)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    /// Full step on `real` with freshly sampled latents.
    pub fn train_step(&self, optimizers: &mut GanOptimizers, real: &Tensor) -> Result<StepLosses> {
        TrainStep::new(self, optimizers, real)?.finish()
    }
}

/// Adam optimizers, one per network.
pub struct GanOptimizers {
    generator: AdamW,
    discriminator: AdamW,
}

impl GanOptimizers {
    /// Adam (β1 0.9, β2 0.999, no weight decay) at `learning_rate` for both.
    pub fn new(gan: &VisemeGan, learning_rate: f64) -> Result<Self> {
        let params = ParamsAdamW {
            lr: learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            weight_decay: 0.0,
        };
        Ok(Self {
            generator: AdamW::new(gan.gen_vars.all_vars(), params.clone())?,
            discriminator: AdamW::new(gan.disc_vars.all_vars(), params)?,
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.generator.learning_rate()
    }
}

/// Losses of one completed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLosses {
    pub generator: f32,
    pub discriminator: f32,
}

impl StepLosses {
    pub fn is_finite(&self) -> bool {
        self.generator.is_finite() && self.discriminator.is_finite()
    }
}

/// Position within a training step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Discriminator,
    Generator,
    Complete,
}

/// One training step, advanced phase by phase.
pub struct TrainStep<'a> {
    gan: &'a VisemeGan,
    optimizers: &'a mut GanOptimizers,
    real: &'a Tensor,
    latent: Tensor,
    phase: StepPhase,
    d_loss: f32,
    g_loss: f32,
}

impl<'a> TrainStep<'a> {
    /// Step with one latent per real clip.
    pub fn new(
        gan: &'a VisemeGan,
        optimizers: &'a mut GanOptimizers,
        real: &'a Tensor,
    ) -> Result<Self> {
        let latent = gan.sample_latent(real.dim(0)?)?;
        Ok(Self::with_latent(gan, optimizers, real, latent))
    }

    /// Step with caller-supplied latents.
    pub fn with_latent(
        gan: &'a VisemeGan,
        optimizers: &'a mut GanOptimizers,
        real: &'a Tensor,
        latent: Tensor,
    ) -> Self {
        Self {
            gan,
            optimizers,
            real,
            latent,
            phase: StepPhase::Discriminator,
            d_loss: f32::NAN,
            g_loss: f32::NAN,
        }
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Run the current phase and move to the next. No-op once complete.
    pub fn advance(&mut self) -> Result<StepPhase> {
        match self.phase {
            StepPhase::Discriminator => {
                self.d_loss =
                    self.gan
                        .discriminator_phase(self.optimizers, self.real, &self.latent)?;
                trace!(d_loss = self.d_loss, "discriminator updated");
                self.phase = StepPhase::Generator;
            }
            StepPhase::Generator => {
                self.g_loss = self.gan.generator_phase(self.optimizers, &self.latent)?;
                trace!(g_loss = self.g_loss, "generator updated");
                self.phase = StepPhase::Complete;
            }
            StepPhase::Complete => {}
        }
        Ok(self.phase)
    }

    /// Run the remaining phases.
    pub fn finish(mut self) -> Result<StepLosses> {
        while self.phase != StepPhase::Complete {
            self.advance()?;
        }
        Ok(StepLosses {
            generator: self.g_loss,
            discriminator: self.d_loss,
        })
    }
}
