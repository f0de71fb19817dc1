//! Geocomply library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`rules`] - rule-hit tagging and jurisdiction inference
//! - [`retrieval`] - hybrid law retrieval with the region fallback cascade
//! - [`scoring`] - passage reranking (cross-encoder, lexical fallback)
//! - [`fewshot`] - feedback-mined prompt examples and the JSONL record streams
//! - [`classify`] - the classification chain, confidence calibration, grounded QA
//!
//! ## Serving
//! - [`cache`] - semantic response cache with an on-disk mirror
//! - [`service`] - cache + classification log around the classifier
//! - [`gateway`] - Axum router
//!
//! ## Collaborators
//! - [`embedding`] - dense embedder and cross-encoder models (candle)
//! - [`vectordb`] - Qdrant law store
//! - [`llm`] - language model client (genai)
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod classify;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod fewshot;
pub mod gateway;
pub mod llm;
pub mod outcome;
pub mod retrieval;
pub mod rules;
pub mod scoring;
pub mod service;
pub mod vectordb;

pub use cache::{CacheConfig, CacheError, CacheStats, SemanticCache};
pub use classify::{
    ClassificationResult, ClassifyError, ClassifyRequest, ComplianceClassifier, LawReference,
    Provenance, QaChain, Verdict,
};
pub use config::{Config, ConfigError};
pub use constants::{DimMismatch, validate_embedding_dim};
pub use embedding::{
    DenseEmbedder, DenseEmbedderConfig, Embedder, EmbeddingError, Reranker, RerankerConfig,
    RerankerError,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use fewshot::{ExampleSelector, FewShotConfig, JsonlStream};
pub use gateway::{GatewayError, GatewayState, create_router};
pub use llm::{GenaiModel, LanguageModel, LlmConfig, LlmError};
#[cfg(any(test, feature = "mock"))]
pub use llm::MockLanguageModel;
pub use outcome::Outcome;
pub use retrieval::{HybridRetriever, RetrievalError, RetrievalOutcome};
pub use rules::{Region, infer_regions, infer_rule_hits};
pub use scoring::{PassageReranker, RerankInfo};
pub use service::{ClassificationService, ResultCache, Served, ServiceRequest};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockLawStore;
pub use vectordb::{LawStore, QdrantLawStore, RetrievedPassage, VectorDbError};
