use std::collections::HashMap;

use parking_lot::RwLock;

use crate::embedding::dense::stub_embedding;
use crate::embedding::{Embedder, EmbeddingError};

/// In-memory embedder with caller-registered vectors.
///
/// Registered text returns its vector verbatim (not normalized, so tests can reason about
/// exact cosine values). Unknown text falls back to the deterministic stub.
#[derive(Debug)]
pub struct MockEmbedder {
    embedding_dim: usize,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    failing: RwLock<bool>,
}

impl MockEmbedder {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim,
            vectors: RwLock::new(HashMap::new()),
            failing: RwLock::new(false),
        }
    }

    /// Registers the vector returned for `text`.
    pub fn register(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.vectors.write().insert(text.into(), vector);
    }

    /// Builder form of [`MockEmbedder::register`].
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.register(text, vector);
        self
    }

    /// Makes every subsequent `embed` call fail.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write() = failing;
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if *self.failing.read() {
            return Err(EmbeddingError::InferenceFailed {
                reason: "mock embedder set to fail".to_string(),
            });
        }

        Ok(self
            .vectors
            .read()
            .get(text)
            .cloned()
            .unwrap_or_else(|| stub_embedding(text, self.embedding_dim)))
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }
}
