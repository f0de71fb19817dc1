//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! The embedding dimension is shared by the dense embedder, the law collection and the
//! semantic cache. [`validate_embedding_dim`] checks it where those meet.

/// Default dense embedding dimension (BGE-M3 sized).
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

/// Max tokens fed to the dense encoder and the cross-encoder.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Default number of passages retrieved per classification.
pub const DEFAULT_TOP_K: usize = 5;

/// Minimum candidate pool for diversity-aware retrieval.
pub const MMR_MIN_FETCH_K: usize = 20;

/// Relevance/diversity trade-off for MMR selection.
pub const MMR_LAMBDA: f32 = 0.5;

/// Default semantic cache similarity threshold.
pub const DEFAULT_CACHE_THRESHOLD: f32 = 0.95;

/// Default semantic cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Calibrated confidence lower bound.
pub const CONFIDENCE_FLOOR: f64 = 0.2;

/// Calibrated confidence upper bound.
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Additive calibration nudge.
pub const CONFIDENCE_NUDGE: f64 = 0.05;

/// Returns the candidate pool size used by diversity-aware retrieval for `k` results.
pub fn mmr_fetch_k(k: usize) -> usize {
    (2 * k).max(MMR_MIN_FETCH_K)
}

/// Embedding size disagreement between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("embedding dimension mismatch: expected {expected}, got {actual}")]
pub struct DimMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Checks a runtime embedding size against the size a component was built for.
///
/// # Example
///
/// ```
/// use geocomply::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// validate_embedding_dim(1024, DEFAULT_EMBEDDING_DIM).unwrap();
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimMismatch> {
    if actual != expected {
        return Err(DimMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmr_fetch_k_has_floor() {
        assert_eq!(mmr_fetch_k(1), 20);
        assert_eq!(mmr_fetch_k(5), 20);
        assert_eq!(mmr_fetch_k(10), 20);
        assert_eq!(mmr_fetch_k(11), 22);
    }

    #[test]
    fn test_validate_embedding_dim_mismatch() {
        assert!(validate_embedding_dim(1024, 1024).is_ok());
        let err = validate_embedding_dim(768, 1024).unwrap_err();
        assert_eq!(
            err,
            DimMismatch {
                expected: 1024,
                actual: 768
            }
        );
        assert!(err.to_string().contains("768"));
    }
}
