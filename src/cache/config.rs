use std::path::PathBuf;

use super::error::CacheError;
use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_THRESHOLD};

/// Default on-disk mirror location.
pub const DEFAULT_CACHE_PATH: &str = "./.data/semantic_cache.json";

/// Semantic cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Mirror file; `None` keeps the cache in memory only.
    pub path: Option<PathBuf>,
    /// Minimum cosine similarity for a hit.
    pub threshold: f32,
    /// Max entries kept after a `set`.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(DEFAULT_CACHE_PATH)),
            threshold: DEFAULT_CACHE_THRESHOLD,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(CacheError::InvalidConfig {
                reason: format!("threshold must be in [0, 1], got {}", self.threshold),
            });
        }
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig {
                reason: "capacity must be > 0".to_string(),
            });
        }
        if let Some(path) = &self.path
            && path.is_dir()
        {
            return Err(CacheError::InvalidConfig {
                reason: format!("cache path is a directory: {}", path.display()),
            });
        }
        Ok(())
    }
}
