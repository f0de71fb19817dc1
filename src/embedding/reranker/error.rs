use std::path::PathBuf;
use thiserror::Error;

/// Cross-encoder failures. Callers fall back to lexical ordering on any of these.
#[derive(Debug, Error)]
pub enum RerankerError {
    #[error("cross-encoder checkpoint missing: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("could not load cross-encoder: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("could not score passage pair: {reason}")]
    InferenceFailed { reason: String },

    #[error("could not tokenize passage pair: {reason}")]
    TokenizationFailed { reason: String },

    #[error("cross-encoder misconfigured: {reason}")]
    InvalidConfig { reason: String },

    #[error("no cross-encoder loaded: {reason}")]
    NotAvailable { reason: String },
}

impl From<candle_core::Error> for RerankerError {
    fn from(err: candle_core::Error) -> Self {
        Self::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
