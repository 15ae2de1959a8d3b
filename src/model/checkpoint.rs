//! On-disk checkpoints, keyed by `(class, epoch)`.
//!
//! ```text
//! <models_root>/<class>/generator_epoch_<N>.safetensors
//! <models_root>/<class>/discriminator_epoch_<N>.safetensors
//! <models_root>/<class>/generator_epoch_<N>.json
//! ```

use super::gan::VisemeGan;
use super::{GanShape, Generator};
use crate::error::{Result, VisemeGanError};
use crate::viseme::VisemeClass;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File locations of one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    pub generator: PathBuf,
    pub discriminator: PathBuf,
    pub metadata: PathBuf,
}

impl CheckpointPaths {
    pub fn new(models_root: &Path, class: VisemeClass, epoch: usize) -> Self {
        let dir = class_dir(models_root, class);
        Self {
            generator: dir.join(format!("generator_epoch_{epoch}.safetensors")),
            discriminator: dir.join(format!("discriminator_epoch_{epoch}.safetensors")),
            metadata: dir.join(format!("generator_epoch_{epoch}.json")),
        }
    }
}

/// Directory holding every checkpoint and sample frame of `class`.
pub fn class_dir(models_root: &Path, class: VisemeClass) -> PathBuf {
    models_root.join(class.dir_name())
}

/// JSON sidecar written next to the generator weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub class: String,
    pub epoch: usize,
    pub shape: GanShape,
}

impl VisemeGan {
    /// Write both networks' weights and the sidecar for `epoch`.
    pub fn save_checkpoint(
        &self,
        models_root: &Path,
        class: VisemeClass,
        epoch: usize,
    ) -> Result<CheckpointPaths> {
        let paths = CheckpointPaths::new(models_root, class, epoch);
        std::fs::create_dir_all(class_dir(models_root, class))?;

        self.generator_vars().save(&paths.generator)?;
        self.discriminator_vars().save(&paths.discriminator)?;
        let meta = CheckpointMeta {
            class: class.dir_name().to_owned(),
            epoch,
            shape: self.shape(),
        };
        std::fs::write(&paths.metadata, serde_json::to_string_pretty(&meta)?)?;

        info!("{class}: saved checkpoint for epoch {epoch}");
        Ok(paths)
    }
}

/// A generator restored from disk, ready for sampling.
pub struct TrainedGenerator {
    class: VisemeClass,
    epoch: usize,
    generator: Generator,
    device: Device,
}

impl TrainedGenerator {
    /// Restore the generator of `class` at `epoch`.
    ///
    /// The architecture comes from the sidecar when present, else `fallback`.
    ///
    /// # Errors
    ///
    /// [`VisemeGanError::CheckpointMissing`] if the weights file does not
    /// exist; tensor errors if the weights do not fit the architecture.
    pub fn load(
        models_root: &Path,
        class: VisemeClass,
        epoch: usize,
        fallback: GanShape,
        device: &Device,
    ) -> Result<Self> {
        let paths = CheckpointPaths::new(models_root, class, epoch);
        if !paths.generator.is_file() {
            return Err(VisemeGanError::CheckpointMissing {
                class: class.dir_name().to_owned(),
                epoch,
                path: paths.generator,
            });
        }

        let shape = match std::fs::read_to_string(&paths.metadata) {
            Ok(text) => serde_json::from_str::<CheckpointMeta>(&text)?.shape,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => fallback,
            Err(e) => return Err(e.into()),
        };

        let mut vars = VarMap::new();
        let generator = Generator::new(shape, VarBuilder::from_varmap(&vars, DType::F32, device))?;
        vars.load(&paths.generator)?;
        debug!("{class}: loaded {}", paths.generator.display());

        Ok(Self {
            class,
            epoch,
            generator,
            device: device.clone(),
        })
    }

    pub fn class(&self) -> VisemeClass {
        self.class
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn shape(&self) -> GanShape {
        self.generator.shape()
    }

    /// One inference-mode clip `(T, H, W, 3)` from a fresh latent.
    pub fn sample_clip(&self) -> Result<Tensor> {
        let z = Tensor::randn(0f32, 1f32, (1, self.shape().latent_dim), &self.device)?;
        Ok(self.generator.forward_t(&z, false)?.squeeze(0)?)
    }
}
