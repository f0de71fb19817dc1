use std::path::PathBuf;
use thiserror::Error;

/// Dense embedder failures (checkpoint loading and encoding).
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedder checkpoint missing: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("could not load embedder checkpoint: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("could not encode text: {reason}")]
    InferenceFailed { reason: String },

    #[error("could not tokenize text: {reason}")]
    TokenizationFailed { reason: String },

    #[error("embedder misconfigured: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        Self::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
