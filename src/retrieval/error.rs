use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::vectordb::VectorDbError;

/// Upstream failures during retrieval. Empty results are not errors.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("law store query failed: {0}")]
    Store(#[from] VectorDbError),

    #[error("law store query timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("embedding task failed: {reason}")]
    TaskFailed { reason: String },
}
