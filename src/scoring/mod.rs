//! Passage reranking.
//!
//! [`PassageReranker`] orders retrieved law passages with a [`RelevanceScorer`] (the
//! cross-encoder [`Reranker`](crate::embedding::Reranker) in production). Reranking never
//! fails the pipeline: a scorer error degrades to Jaccard word overlap.

pub mod error;
mod lexical;
pub mod scorer;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ScoringError;
pub use lexical::jaccard;
pub use scorer::{PassageReranker, RelevanceScorer, Reranked};
pub use types::RerankInfo;
