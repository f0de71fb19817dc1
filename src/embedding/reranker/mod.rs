pub mod config;
pub mod error;


pub use config::{MAX_SEQ_LEN, RerankerConfig};
pub use error::RerankerError;

use candle_core::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedding::bert::BertClassifier;
use crate::embedding::device::select_device;
use crate::embedding::utils::load_tokenizer_with_truncation;

struct LoadedModel {
    classifier: BertClassifier,
    tokenizer: Tokenizer,
    model_id: String,
}

/// Cross-encoder relevance scorer for (query, passage) pairs.
pub struct Reranker {
    device: candle_core::Device,
    config: RerankerConfig,
    model: Option<LoadedModel>,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("model_loaded", &self.is_model_loaded())
            .finish()
    }
}

impl Reranker {
    pub fn load(config: RerankerConfig) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for reranker");

        let Some(model_path) = config.model_path.clone() else {
            info!("No reranker model path configured, reranking unavailable");
            return Ok(Self {
                device,
                config,
                model: None,
            });
        };

        if !model_path.exists() {
            return Err(RerankerError::ModelNotFound { path: model_path });
        }

        for file in ["config.json", "model.safetensors"] {
            if !model_path.join(file).exists() {
                return Err(RerankerError::ModelLoadFailed {
                    reason: format!("missing {file} in {}", model_path.display()),
                });
            }
        }

        info!(model_path = %model_path.display(), "Loading reranker model");

        let classifier = BertClassifier::load(&model_path, &device).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("failed to load cross-encoder: {e}"),
            }
        })?;

        let tokenizer =
            load_tokenizer_with_truncation(&model_path, config.max_seq_len).map_err(|e| {
                RerankerError::ModelLoadFailed {
                    reason: format!("failed to load tokenizer: {e}"),
                }
            })?;

        let model_id = config.model_id().unwrap_or_default();
        info!(model_id = %model_id, "Reranker model loaded successfully");

        Ok(Self {
            device,
            config,
            model: Some(LoadedModel {
                classifier,
                tokenizer,
                model_id,
            }),
        })
    }

    /// A reranker with no model; every score call reports [`RerankerError::NotAvailable`].
    pub fn unloaded() -> Self {
        Self {
            device: candle_core::Device::Cpu,
            config: RerankerConfig::unloaded(),
            model: None,
        }
    }

    /// Raw relevance logit for one pair.
    pub fn score(&self, query: &str, candidate: &str) -> Result<f32, RerankerError> {
        let Some(model) = &self.model else {
            return Err(RerankerError::NotAvailable {
                reason: "no cross-encoder loaded".to_string(),
            });
        };

        let tokens = model
            .tokenizer
            .encode((query, candidate), true)
            .map_err(|e| RerankerError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let token_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(tokens.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = model
            .classifier
            .forward(&token_ids, &type_ids, Some(&attention_mask))
            .map_err(|e| RerankerError::InferenceFailed {
                reason: e.to_string(),
            })?;

        let scores = logits.flatten_all()?.to_vec1::<f32>()?;
        scores
            .first()
            .copied()
            .ok_or_else(|| RerankerError::InferenceFailed {
                reason: "cross-encoder returned no logits".to_string(),
            })
    }

    /// Scores every candidate against `query`, in input order.
    pub fn score_all(&self, query: &str, candidates: &[&str]) -> Result<Vec<f32>, RerankerError> {
        debug!(
            query_len = query.len(),
            num_candidates = candidates.len(),
            "Scoring candidates"
        );

        candidates
            .iter()
            .map(|candidate| self.score(query, candidate))
            .collect()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Identifier of the loaded checkpoint.
    pub fn model_id(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.model_id.as_str())
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }
}
