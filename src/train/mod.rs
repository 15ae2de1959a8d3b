//! Per-class GAN training.
//!
//! Classes are trained one after another, each with its own dataset,
//! networks and optimizers. A failing class is reported and skipped; it never
//! stops the remaining classes.

pub mod samples;

use crate::config::VisemeGanConfig;
use crate::dataset::ClipDataset;
use crate::error::{Result, VisemeGanError};
use crate::model::checkpoint::class_dir;
use crate::model::{GanOptimizers, GanShape, StepLosses, VisemeGan};
use crate::progress::{TrainingCallback, TrainingEvent};
use crate::viseme::VisemeClass;
use candle_core::Device;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Summary of one class's training run.
#[derive(Debug, Clone)]
pub struct ClassReport {
    pub class: VisemeClass,
    /// Epochs run to completion.
    pub epochs_completed: usize,
    /// Losses of the last batch of the last epoch.
    pub final_losses: Option<StepLosses>,
    /// Epochs at which a checkpoint was written.
    pub checkpoints: Vec<usize>,
    pub duration_secs: f64,
}

/// Drives training for one or more viseme classes.
pub struct Trainer {
    config: VisemeGanConfig,
    device: Device,
    callback: Option<TrainingCallback>,
}

impl Trainer {
    pub fn new(config: VisemeGanConfig, device: Device) -> Self {
        Self {
            config,
            device,
            callback: None,
        }
    }

    /// Receive [`TrainingEvent`]s as training progresses.
    pub fn with_callback(mut self, callback: TrainingCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn config(&self) -> &VisemeGanConfig {
        &self.config
    }

    fn emit(&self, event: TrainingEvent) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Train `classes` in order (all classes when empty).
    ///
    /// Returns one entry per class; failures are logged and reported.
    pub fn train_all(&self, classes: &[VisemeClass]) -> Vec<(VisemeClass, Result<ClassReport>)> {
        let classes = if classes.is_empty() {
            &VisemeClass::ALL[..]
        } else {
            classes
        };

        let mut reports = Vec::with_capacity(classes.len());
        for &class in classes {
            let result = self.train_class(class);
            if let Err(e) = &result {
                error!("{class}: training failed: {e}");
                self.emit(TrainingEvent::ClassFailed {
                    class,
                    message: e.to_string(),
                });
            }
            reports.push((class, result));
        }
        reports
    }

    /// Train a single class from scratch.
    ///
    /// # Errors
    ///
    /// - [`VisemeGanError::Dataset`] if the class has no clips, or an epoch
    ///   yields no batch.
    /// - [`VisemeGanError::TrainingDiverged`] on a non-finite loss when
    ///   `halt_on_divergence` is set.
    /// - Tensor and I/O errors from training or checkpointing.
    pub fn train_class(&self, class: VisemeClass) -> Result<ClassReport> {
        let train = &self.config.train;
        let dataset = ClipDataset::open(&self.config.paths.cropped_dir, class, train, &self.device)?;

        if let Err(e) = self.device.set_seed(train.seed) {
            debug!("device RNG not seeded: {e}");
        }
        let mut rng = StdRng::seed_from_u64(train.seed);

        let gan = VisemeGan::new(GanShape::from(train), &self.device)?;
        let mut optimizers = GanOptimizers::new(&gan, train.learning_rate)?;
        let save_dir = class_dir(&self.config.paths.models_root, class);

        info!(
            "{class}: training {} epochs over {} clip directories",
            train.epochs,
            dataset.clip_dir_count()
        );
        self.emit(TrainingEvent::ClassStarted {
            class,
            epochs: train.epochs,
            clip_dirs: dataset.clip_dir_count(),
        });

        let started = Instant::now();
        let mut report = ClassReport {
            class,
            epochs_completed: 0,
            final_losses: None,
            checkpoints: Vec::new(),
            duration_secs: 0.0,
        };

        for epoch in 1..=train.epochs {
            let mut last = None;
            let mut batches = 0;
            for batch in dataset.epoch(&mut rng) {
                let real = batch?;
                let losses = gan.train_step(&mut optimizers, &real)?;
                batches += 1;
                debug!(
                    "{class}: epoch {epoch} batch {batches} G={:.4} D={:.4}",
                    losses.generator, losses.discriminator
                );
                last = Some(losses);
                if train.max_batches_per_epoch.is_some_and(|max| batches >= max) {
                    break;
                }
            }

            let Some(losses) = last else {
                return Err(VisemeGanError::Dataset(format!(
                    "{class}: no loadable clips"
                )));
            };

            if !losses.is_finite() {
                if train.halt_on_divergence {
                    return Err(VisemeGanError::TrainingDiverged {
                        class: class.dir_name().to_owned(),
                        epoch,
                        g_loss: losses.generator,
                        d_loss: losses.discriminator,
                    });
                }
                warn!("{class}: non-finite loss at epoch {epoch}, continuing");
            }

            info!(
                "[{class}] Epoch {epoch}/{} | G={:.4} D={:.4}",
                train.epochs, losses.generator, losses.discriminator
            );
            self.emit(TrainingEvent::EpochFinished {
                class,
                epoch,
                epochs: train.epochs,
                batches,
                losses,
            });
            report.epochs_completed = epoch;
            report.final_losses = Some(losses);

            if train.checkpoint_interval > 0 && epoch % train.checkpoint_interval == 0 {
                samples::save_sample_frames(&gan, &save_dir, epoch)?;
                let paths = gan.save_checkpoint(&self.config.paths.models_root, class, epoch)?;
                self.emit(TrainingEvent::CheckpointSaved {
                    class,
                    epoch,
                    path: paths.generator,
                });
                report.checkpoints.push(epoch);
            }
        }

        report.duration_secs = started.elapsed().as_secs_f64();
        self.emit(TrainingEvent::ClassFinished {
            class,
            losses: report.final_losses,
            duration_secs: report.duration_secs,
        });
        Ok(report)
    }
}
