use thiserror::Error;

use crate::embedding::RerankerError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("reranker error: {0}")]
    Reranker(#[from] RerankerError),

    #[error("scorer returned {actual} scores for {expected} passages")]
    ScoreCountMismatch { expected: usize, actual: usize },

    #[error("scoring computation failed: {reason}")]
    ComputationFailed { reason: String },
}
