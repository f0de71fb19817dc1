//! Semantic response cache.
//!
//! Entries are matched by cosine similarity of their key embeddings (linear scan) and
//! evicted by capacity, newest kept. There is no time-to-live.

mod config;
mod entry;
mod error;
mod semantic;


pub use config::{CacheConfig, DEFAULT_CACHE_PATH};
pub use entry::{CacheEntry, CacheStats, key_hash};
pub use error::CacheError;
pub use semantic::SemanticCache;

/// Response header reporting whether a classification came from the cache.
pub const CACHE_STATUS_HEADER: &str = "X-Geocomply-Cache";
pub const CACHE_STATUS_HIT: &str = "HIT";
pub const CACHE_STATUS_MISS: &str = "MISS";
