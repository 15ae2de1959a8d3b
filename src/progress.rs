//! Progress event types for per-class GAN training.
//!
//! Provides callback-based progress reporting that decouples the trainer
//! from presentation (indicatif bars in the CLI, plain logs elsewhere).

use crate::model::StepLosses;
use crate::viseme::VisemeClass;
use std::path::PathBuf;

/// Progress events emitted while training viseme classes.
#[derive(Debug, Clone)]
pub enum TrainingEvent {
    /// Training of a class has started.
    ClassStarted {
        class: VisemeClass,
        /// Planned number of epochs.
        epochs: usize,
        /// Clip directories found for the class.
        clip_dirs: usize,
    },

    /// An epoch completed.
    EpochFinished {
        class: VisemeClass,
        /// 1-based epoch number.
        epoch: usize,
        /// Planned number of epochs.
        epochs: usize,
        /// Batches processed this epoch.
        batches: usize,
        /// Losses of the epoch's last batch.
        losses: StepLosses,
    },

    /// Weights and sample frames were written.
    CheckpointSaved {
        class: VisemeClass,
        epoch: usize,
        /// Generator weights file.
        path: PathBuf,
    },

    /// A class finished all epochs.
    ClassFinished {
        class: VisemeClass,
        /// Losses reported for the final epoch.
        losses: Option<StepLosses>,
        /// Wall time in seconds.
        duration_secs: f64,
    },

    /// A class stopped with an error; other classes continue.
    ClassFailed {
        class: VisemeClass,
        /// Human-readable error description.
        message: String,
    },
}

impl TrainingEvent {
    /// Class the event refers to.
    pub fn class(&self) -> VisemeClass {
        match self {
            TrainingEvent::ClassStarted { class, .. }
            | TrainingEvent::EpochFinished { class, .. }
            | TrainingEvent::CheckpointSaved { class, .. }
            | TrainingEvent::ClassFinished { class, .. }
            | TrainingEvent::ClassFailed { class, .. } => *class,
        }
    }
}

/// Callback type for receiving training events.
pub type TrainingCallback = Box<dyn Fn(TrainingEvent) + Send + Sync>;
