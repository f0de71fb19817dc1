use std::path::PathBuf;

use crate::embedding::error::EmbeddingError;

/// Default dense embedding dimension.
pub const DENSE_EMBEDDING_DIM: usize = crate::constants::DEFAULT_EMBEDDING_DIM;

/// Default dense encoder window.
pub const DENSE_MAX_SEQ_LEN: usize = crate::constants::DEFAULT_MAX_SEQ_LEN;

/// Configuration for [`DenseEmbedder`](super::DenseEmbedder).
#[derive(Debug, Clone)]
pub struct DenseEmbedderConfig {
    /// Checkpoint directory holding `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_dir: Option<PathBuf>,
    /// Max tokens fed to the encoder.
    pub max_seq_len: usize,
    /// Output embedding dimension.
    pub embedding_dim: usize,
}

impl Default for DenseEmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            max_seq_len: DENSE_MAX_SEQ_LEN,
            embedding_dim: DENSE_EMBEDDING_DIM,
        }
    }
}

impl DenseEmbedderConfig {
    /// Config for a checkpoint directory.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
            ..Default::default()
        }
    }

    /// Config for the deterministic stub (no model files).
    pub fn stub() -> Self {
        Self::default()
    }

    pub fn with_embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.embedding_dim = embedding_dim;
        self
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    /// Returns `true` when no checkpoint is configured.
    pub fn is_stub(&self) -> bool {
        self.model_dir.is_none()
    }

    /// Checks sizes and, when a checkpoint is configured, that its files exist.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.embedding_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding_dim must be greater than zero".to_string(),
            });
        }

        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }

        let Some(dir) = &self.model_dir else {
            return Ok(());
        };

        if !dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound { path: dir.clone() });
        }

        for file in ["config.json", "model.safetensors", "tokenizer.json"] {
            let path = dir.join(file);
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path });
            }
        }

        Ok(())
    }
}
