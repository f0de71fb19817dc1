//! Embedding + model utilities.
//!
//! - [`dense`] turns text into unit vectors for retrieval and the semantic cache.
//! - [`reranker`] provides the cross-encoder used by [`crate::scoring`].

/// BERT encoder and classifier wrappers.
pub mod bert;
/// Dense embedder.
pub mod dense;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
/// Cross-encoder reranker.
pub mod reranker;
/// Tokenizer loading and vector math helpers.
pub mod utils;

pub use dense::{DENSE_EMBEDDING_DIM, DENSE_MAX_SEQ_LEN, DenseEmbedder, DenseEmbedderConfig};
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use reranker::{Reranker, RerankerConfig, RerankerError};
pub use utils::{cosine_similarity, l2_normalize};

/// Text → fixed-length vector. Deterministic for identical input.
pub trait Embedder: Send + Sync {
    /// Embeds one string.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output vector length.
    fn embedding_dim(&self) -> usize;
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }

    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }
}
