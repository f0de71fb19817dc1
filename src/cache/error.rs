use std::path::PathBuf;

use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Semantic cache failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache key embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("cache mirror i/o failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry serialization failed: {reason}")]
    Serialize { reason: String },

    #[error("cache task failed: {reason}")]
    TaskFailed { reason: String },

    #[error("invalid cache configuration: {reason}")]
    InvalidConfig { reason: String },
}
