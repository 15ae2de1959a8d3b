//! visemegan: lip animation of single words from per-viseme 3D GANs.
//!
//! Two paths share the on-disk checkpoints:
//!
//! - **Training**: cropped mouth clips per viseme class -> [`dataset`] ->
//!   [`model::VisemeGan`] -> [`train::Trainer`] -> weights per `(class, epoch)`.
//! - **Synthesis**: word -> [`phonemes`] -> [`viseme`] classes + [`duration`]s ->
//!   per-class generators -> [`media`] frames, GIF and MP4
//!   ([`synth::WordSynthesizer`]).
//!
//! Everything runs synchronously on one thread; candle picks the device.

pub mod config;
pub mod dataset;
pub mod dirs;
pub mod duration;
pub mod error;
pub mod media;
pub mod model;
pub mod phonemes;
pub mod preview;
pub mod progress;
pub mod synth;
pub mod train;
pub mod viseme;

pub use config::{SamplingMode, VisemeGanConfig};
pub use error::{Result, VisemeGanError};
pub use model::{GanShape, TrainedGenerator, VisemeGan};
pub use progress::{TrainingCallback, TrainingEvent};
pub use synth::{WordOutput, WordSynthesizer};
pub use train::{ClassReport, Trainer};
pub use viseme::VisemeClass;
