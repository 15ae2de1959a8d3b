//! Per-class generator cache for a synthesis session.

use crate::error::{Result, VisemeGanError};
use crate::model::{GanShape, TrainedGenerator};
use crate::viseme::VisemeClass;
use candle_core::Device;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use tracing::debug;

/// Generators loaded on first use and kept for the session.
///
/// A class whose checkpoint is missing is remembered as absent so the disk is
/// probed once per session.
pub struct GeneratorArena {
    models_root: PathBuf,
    epoch: usize,
    fallback: GanShape,
    device: Device,
    slots: HashMap<VisemeClass, Option<TrainedGenerator>>,
}

impl GeneratorArena {
    pub fn new(models_root: PathBuf, epoch: usize, fallback: GanShape, device: Device) -> Self {
        Self {
            models_root,
            epoch,
            fallback,
            device,
            slots: HashMap::new(),
        }
    }

    /// Generator of `class`, or `None` if it has no checkpoint at the epoch.
    ///
    /// # Errors
    ///
    /// Checkpoints that exist but fail to load.
    pub fn get(&mut self, class: VisemeClass) -> Result<Option<&TrainedGenerator>> {
        match self.slots.entry(class) {
            Entry::Occupied(slot) => Ok(slot.into_mut().as_ref()),
            Entry::Vacant(slot) => {
                let loaded = match TrainedGenerator::load(
                    &self.models_root,
                    class,
                    self.epoch,
                    self.fallback,
                    &self.device,
                ) {
                    Ok(generator) => Some(generator),
                    Err(VisemeGanError::CheckpointMissing { path, .. }) => {
                        debug!("{class}: no generator at {}", path.display());
                        None
                    }
                    Err(e) => return Err(e),
                };
                Ok(slot.insert(loaded).as_ref())
            }
        }
    }

    /// Classes with a loaded generator.
    pub fn loaded(&self) -> usize {
        self.slots.values().filter(|s| s.is_some()).count()
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }
}
