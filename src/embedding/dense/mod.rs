//! Dense embedder for law retrieval and cache keys.
//!
//! Loads a BERT-family checkpoint (BGE-M3 sized by default) and pools the CLS token. Use
//! [`DenseEmbedderConfig::stub`] for tests and local runs without model files.

/// Dense embedder configuration.
pub mod config;


pub use config::{DENSE_EMBEDDING_DIM, DENSE_MAX_SEQ_LEN, DenseEmbedderConfig};

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::Embedder;
use crate::embedding::bert::BertEncoder;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{l2_normalize, load_tokenizer_with_truncation};

enum EmbedderBackend {
    Model {
        encoder: BertEncoder,
        tokenizer: Box<Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Produces unit-length dense vectors (supports stub mode).
pub struct DenseEmbedder {
    backend: EmbedderBackend,
    config: DenseEmbedderConfig,
}

impl std::fmt::Debug for DenseEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({device:?})"),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl DenseEmbedder {
    /// Loads the embedder; a config without `model_dir` yields the stub backend.
    pub fn load(config: DenseEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let Some(model_dir) = config.model_dir.clone() else {
            warn!(
                embedding_dim = config.embedding_dim,
                "Dense embedder running in STUB mode (hash-seeded vectors)"
            );
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        };

        let device = select_device();
        debug!(?device, "Selected compute device for dense embedder");

        let encoder =
            BertEncoder::load(&model_dir, &device).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to load encoder: {e}"),
            })?;

        if config.embedding_dim > encoder.hidden_size() {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "embedding_dim ({}) exceeds model hidden_size ({})",
                    config.embedding_dim,
                    encoder.hidden_size()
                ),
            });
        }

        let tokenizer = load_tokenizer_with_truncation(&model_dir, config.max_seq_len).map_err(
            |e| EmbeddingError::TokenizationFailed {
                reason: format!("failed to load tokenizer: {e}"),
            },
        )?;

        info!(
            model_dir = %model_dir.display(),
            embedding_dim = config.embedding_dim,
            hidden_size = encoder.hidden_size(),
            max_seq_len = config.max_seq_len,
            "Dense embedder loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                encoder,
                tokenizer: Box::new(tokenizer),
                device,
            },
            config,
        })
    }

    /// Shorthand for a stub embedder of the given dimension.
    pub fn stub(embedding_dim: usize) -> Result<Self, EmbeddingError> {
        Self::load(DenseEmbedderConfig::stub().with_embedding_dim(embedding_dim))
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &DenseEmbedderConfig {
        &self.config
    }

    fn embed_with_model(
        &self,
        text: &str,
        encoder: &BertEncoder,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(vec![0.0; self.config.embedding_dim]);
        }

        debug!(
            text_len = text.len(),
            token_count = ids.len(),
            "Generating dense embedding"
        );

        let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let cls = encoder.encode_cls(&input_ids, &type_ids, Some(&attention_mask))?;
        let mut embedding = cls.narrow(0, 0, self.config.embedding_dim)?.to_vec1::<f32>()?;

        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Deterministic unit vector seeded from the BLAKE3 hash of `text`.
pub fn stub_embedding(text: &str, embedding_dim: usize) -> Vec<f32> {
    let digest = blake3::hash(text.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest.as_bytes()[..8]);
    let mut state = u64::from_le_bytes(seed);

    let mut embedding = Vec::with_capacity(embedding_dim);
    for _ in 0..embedding_dim {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        embedding.push(value);
    }

    l2_normalize(&mut embedding);
    embedding
}

impl Embedder for DenseEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model {
                encoder,
                tokenizer,
                device,
            } => self.embed_with_model(text, encoder, tokenizer, device),
            EmbedderBackend::Stub => Ok(stub_embedding(text, self.config.embedding_dim)),
        }
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }
}
