//! Error types for visemegan.

use std::path::PathBuf;

/// Top-level error type for training and word synthesis.
#[derive(Debug, thiserror::Error)]
pub enum VisemeGanError {
    /// Word missing from the pronouncing dictionary, or dictionary unavailable.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// No checkpoint exists for a viseme class at the requested epoch.
    #[error("no checkpoint for {class} at epoch {epoch} (looked in {})", path.display())]
    CheckpointMissing {
        /// Viseme class directory name.
        class: String,
        /// Requested epoch.
        epoch: usize,
        /// Weights file that was expected.
        path: PathBuf,
    },

    /// Dataset construction or iteration error.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Tensor / autodiff backend error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Image decode or encode error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Video encoding error.
    #[error("encode error: {0}")]
    Encode(String),

    /// The external video encoder could not be located.
    #[error("encoder not found: {reason}")]
    EncoderNotFound {
        /// Locations that were searched.
        reason: String,
    },

    /// A loss became NaN or infinite.
    #[error("training diverged for {class} at epoch {epoch} (G={g_loss}, D={d_loss})")]
    TrainingDiverged {
        /// Viseme class directory name.
        class: String,
        /// Epoch at which divergence was observed (1-based).
        epoch: usize,
        /// Generator loss.
        g_loss: f32,
        /// Discriminator loss.
        d_loss: f32,
    },

    /// Every phoneme of a word was skipped, leaving nothing to encode.
    #[error("no frames generated for \"{word}\": every phoneme was skipped")]
    EmptyAnimation {
        /// The requested word.
        word: String,
    },

    /// JSON (checkpoint sidecar) error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, VisemeGanError>;
