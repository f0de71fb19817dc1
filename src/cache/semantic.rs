use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use super::entry::{CacheEntry, CacheStats, key_hash};
use super::error::CacheError;
use crate::constants::validate_embedding_dim;
use crate::embedding::{Embedder, cosine_similarity};

/// Embedding-similarity response cache with a JSON mirror on disk.
///
/// One lock covers the entry list and the mirror, so concurrent `get`/`set`/`clear` never
/// observe a half-written list. The mirror is rewritten in full after each `set` and
/// removed on `clear`.
pub struct SemanticCache<R> {
    embedder: Arc<dyn Embedder>,
    config: CacheConfig,
    entries: Mutex<Vec<CacheEntry<R>>>,
}

impl<R> std::fmt::Debug for SemanticCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticCache")
            .field("config", &self.config)
            .field("entries", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}

impl<R> SemanticCache<R>
where
    R: Serialize + DeserializeOwned + Clone,
{
    /// Builds the cache, loading the mirror if present. A corrupt mirror starts empty.
    pub fn open(embedder: Arc<dyn Embedder>, config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let entries = match &config.path {
            Some(path) => load_mirror(path, embedder.embedding_dim()),
            None => Vec::new(),
        };
        info!(
            entries = entries.len(),
            threshold = config.threshold,
            capacity = config.capacity,
            "Semantic cache ready"
        );

        Ok(Self {
            embedder,
            config,
            entries: Mutex::new(entries),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the response of the most similar entry if its similarity reaches the threshold.
    ///
    /// Identical key text short-circuits to the oldest entry with the same hash, as long as
    /// that entry could reach the threshold by similarity: its embedding has non-zero norm
    /// and the threshold is below 1.0.
    pub fn get(&self, query: &str) -> Result<Option<R>, CacheError> {
        let hash = key_hash(query);
        {
            let entries = self.entries.lock();
            if entries.is_empty() {
                return Ok(None);
            }
            let exact = entries
                .iter()
                .find(|e| e.key_hash.as_deref() == Some(hash.as_str()))
                .filter(|e| self.config.threshold < 1.0 && has_nonzero_norm(&e.embedding));
            if let Some(entry) = exact {
                debug!("Semantic cache exact hit");
                return Ok(Some(entry.response.clone()));
            }
        }

        let embedding = self.embedder.embed(query)?;

        let entries = self.entries.lock();
        let mut best: Option<(f32, &CacheEntry<R>)> = None;
        for entry in entries.iter() {
            if entry.embedding.len() != embedding.len() {
                continue;
            }
            let similarity = cosine_similarity(&embedding, &entry.embedding);
            if best.is_none_or(|(score, _)| similarity > score) {
                best = Some((similarity, entry));
            }
        }

        match best {
            Some((similarity, entry)) if similarity >= self.config.threshold => {
                debug!(similarity, "Semantic cache hit");
                Ok(Some(entry.response.clone()))
            }
            Some((similarity, _)) => {
                debug!(similarity, threshold = self.config.threshold, "Semantic cache miss");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Stores `response` under `query`, evicts down to capacity, then rewrites the mirror.
    pub fn set(&self, query: &str, response: R) -> Result<(), CacheError> {
        let embedding = self.embedder.embed(query)?;
        let entry = CacheEntry::new(query, embedding, response);

        let mut entries = self.entries.lock();
        entries.push(entry);
        evict_oldest(&mut entries, self.config.capacity);
        self.write_mirror(&entries)
    }

    /// Drops every entry and deletes the mirror.
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        entries.clear();

        if let Some(path) = &self.config.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::Io {
                        path: path.clone(),
                        source: e,
                    });
                }
            }
        }
        info!("Semantic cache cleared");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            count: self.entries.lock().len(),
            threshold: self.config.threshold,
            capacity: self.config.capacity,
        }
    }

    /// Writes the current entries to the mirror.
    pub fn persist(&self) -> Result<(), CacheError> {
        let entries = self.entries.lock();
        self.write_mirror(&entries)
    }

    fn write_mirror(&self, entries: &[CacheEntry<R>]) -> Result<(), CacheError> {
        let Some(path) = &self.config.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(entries).map_err(|e| CacheError::Serialize {
            reason: e.to_string(),
        })?;
        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.clone(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

fn has_nonzero_norm(embedding: &[f32]) -> bool {
    embedding.iter().any(|x| *x != 0.0)
}

/// Keeps the `capacity` newest entries, preserving their relative order.
fn evict_oldest<R>(entries: &mut Vec<CacheEntry<R>>, capacity: usize) {
    if entries.len() <= capacity {
        return;
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        (entries[b].created_at, b).cmp(&(entries[a].created_at, a))
    });

    let mut keep = vec![false; entries.len()];
    for &idx in order.iter().take(capacity) {
        keep[idx] = true;
    }

    let before = entries.len();
    let mut idx = 0;
    entries.retain(|_| {
        let kept = keep[idx];
        idx += 1;
        kept
    });
    debug!(evicted = before - entries.len(), "Semantic cache evicted entries");
}

fn load_mirror<R: DeserializeOwned>(path: &Path, dim: usize) -> Vec<CacheEntry<R>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache mirror unreadable, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_slice::<Vec<CacheEntry<R>>>(&bytes) {
        Ok(entries) => {
            let total = entries.len();
            let entries: Vec<_> = entries
                .into_iter()
                .filter(|e| validate_embedding_dim(e.embedding.len(), dim).is_ok())
                .collect();
            if entries.len() < total {
                warn!(
                    dropped = total - entries.len(),
                    expected_dim = dim,
                    "Dropped cache entries with mismatched embedding size"
                );
            }
            entries
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache mirror corrupt, starting empty");
            Vec::new()
        }
    }
}
