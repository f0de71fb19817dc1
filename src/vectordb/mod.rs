//! Law corpus vector store (Qdrant hybrid search).

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod mmr;
pub mod model;

#[cfg(test)]
mod tests;

pub use client::{
    BM25_MODEL, DENSE_VECTOR_NAME, LawStore, QdrantLawStore, SPARSE_VECTOR_NAME, region_filter,
};
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLawStore;
pub use model::{PassageMetadata, RetrievedPassage, ScoredPassage, SearchMode, SearchRequest};

/// Default law collection name.
pub const DEFAULT_COLLECTION_NAME: &str = "laws";
