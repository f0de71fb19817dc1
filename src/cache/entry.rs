use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached query/response pair. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<R> {
    pub query: String,
    /// BLAKE3 hex digest of `query`; absent in older mirrors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_hash: Option<String>,
    #[serde(rename = "query_embedding")]
    pub embedding: Vec<f32>,
    pub response: R,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl<R> CacheEntry<R> {
    pub fn new(query: impl Into<String>, embedding: Vec<f32>, response: R) -> Self {
        let query = query.into();
        Self {
            key_hash: Some(key_hash(&query)),
            query,
            embedding,
            response,
            created_at: Utc::now(),
        }
    }
}

/// Hex BLAKE3 digest of a cache key.
pub fn key_hash(query: &str) -> String {
    blake3::hash(query.as_bytes()).to_hex().to_string()
}

/// `{count, threshold, capacity}` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub count: usize,
    pub threshold: f32,
    pub capacity: usize,
}
