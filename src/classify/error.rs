use thiserror::Error;

use crate::llm::LlmError;
use crate::retrieval::RetrievalError;

/// Unrecovered classification failures. Degraded stages never surface here.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("language model failed: {0}")]
    Llm(#[from] LlmError),

    #[error("{stage} timed out after {after_ms}ms")]
    Timeout { stage: &'static str, after_ms: u64 },

    #[error("{stage} task failed: {reason}")]
    TaskFailed { stage: &'static str, reason: String },
}
