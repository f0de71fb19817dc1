//! Hybrid retrieval with jurisdiction filtering and a fallback cascade.
//!
//! [`HybridRetriever::retrieve`] is a single store query. [`HybridRetriever::retrieve_with_cascade`]
//! is what classification uses:
//!
//! 1. filter on every inferred region;
//! 2. if empty, filter on each region alone (first non-empty wins);
//! 3. if still empty, search unfiltered;
//! 4. after an unfiltered success, keep only passages tagged with an inferred region
//!    (truncated to `k`). If any survive, the result counts as filtered.
//!
//! The safeguard in step 4 can return fewer than `k` passages; only `filtered_used` records it.

mod error;


pub use error::RetrievalError;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::embedding::Embedder;
use crate::rules::Region;
use crate::vectordb::{LawStore, RetrievedPassage, SearchMode, SearchRequest};

/// One store query made by the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalAttempt {
    /// Region filter used; empty means unfiltered.
    pub regions: Vec<Region>,
    /// Passages returned.
    pub hits: usize,
}

/// Cascade result.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOutcome {
    pub passages: Vec<RetrievedPassage>,
    /// `true` when the passages came from (or were narrowed to) the jurisdiction filter.
    pub filtered_used: bool,
    /// Every store query, in order.
    pub attempts: Vec<RetrievalAttempt>,
    /// `true` when step 4 narrowed unfiltered results.
    pub safeguard_applied: bool,
}

/// Embeds queries and searches the law store.
pub struct HybridRetriever<S> {
    embedder: Arc<dyn Embedder>,
    store: S,
    store_timeout: Option<Duration>,
}

impl<S: LawStore> HybridRetriever<S> {
    pub fn new(embedder: Arc<dyn Embedder>, store: S) -> Self {
        Self {
            embedder,
            store,
            store_timeout: None,
        }
    }

    /// Bounds every store query.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embeds `text` off the async runtime.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let embedder = Arc::clone(&self.embedder);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| RetrievalError::TaskFailed {
                reason: e.to_string(),
            })?
            .map_err(RetrievalError::from)
    }

    /// Single query: `regions` non-empty applies `region ∈ regions`, otherwise no filter.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        use_mmr: bool,
        regions: Option<&[Region]>,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let vector = self.embed_query(query).await?;
        self.search(query, &vector, k, use_mmr, regions.unwrap_or_default())
            .await
    }

    /// Runs the fallback cascade for `regions` (see module docs).
    #[instrument(skip(self, query), fields(query_len = query.len(), regions = ?regions))]
    pub async fn retrieve_with_cascade(
        &self,
        query: &str,
        k: usize,
        use_mmr: bool,
        regions: &[Region],
    ) -> Result<RetrievalOutcome, RetrievalError> {
        let vector = self.embed_query(query).await?;
        let mut attempts = Vec::new();

        if !regions.is_empty() {
            let passages = self
                .attempt(query, &vector, k, use_mmr, regions, &mut attempts)
                .await?;
            if !passages.is_empty() {
                return Ok(RetrievalOutcome::filtered(passages, attempts));
            }

            for region in regions {
                let passages = self
                    .attempt(
                        query,
                        &vector,
                        k,
                        use_mmr,
                        std::slice::from_ref(region),
                        &mut attempts,
                    )
                    .await?;
                if !passages.is_empty() {
                    debug!(region = %region, "Single-region retry succeeded");
                    return Ok(RetrievalOutcome::filtered(passages, attempts));
                }
            }

            info!(regions = ?regions, "No passages under region filter, retrying unfiltered");
        }

        let passages = self
            .attempt(query, &vector, k, use_mmr, &[], &mut attempts)
            .await?;

        if regions.is_empty() || passages.is_empty() {
            return Ok(RetrievalOutcome {
                passages,
                filtered_used: false,
                attempts,
                safeguard_applied: false,
            });
        }

        let kept: Vec<RetrievedPassage> = passages
            .iter()
            .filter(|p| p.metadata.region_in(regions))
            .take(k)
            .cloned()
            .collect();

        if kept.is_empty() {
            warn!(
                hits = passages.len(),
                "Unfiltered passages match no inferred region, keeping them as-is"
            );
            return Ok(RetrievalOutcome {
                passages,
                filtered_used: false,
                attempts,
                safeguard_applied: false,
            });
        }

        debug!(
            kept = kept.len(),
            dropped = passages.len() - kept.len(),
            "Region safeguard narrowed unfiltered passages"
        );

        Ok(RetrievalOutcome {
            passages: kept,
            filtered_used: true,
            attempts,
            safeguard_applied: true,
        })
    }

    async fn attempt(
        &self,
        query: &str,
        vector: &[f32],
        k: usize,
        use_mmr: bool,
        regions: &[Region],
        attempts: &mut Vec<RetrievalAttempt>,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let passages = self.search(query, vector, k, use_mmr, regions).await?;
        attempts.push(RetrievalAttempt {
            regions: regions.to_vec(),
            hits: passages.len(),
        });
        Ok(passages)
    }

    async fn search(
        &self,
        query: &str,
        vector: &[f32],
        k: usize,
        use_mmr: bool,
        regions: &[Region],
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let request = SearchRequest {
            text: query.to_string(),
            vector: vector.to_vec(),
            k,
            mode: SearchMode::from_mmr_flag(use_mmr),
            regions: (!regions.is_empty()).then(|| regions.to_vec()),
        };

        let search = self.store.search(request);
        let results = match self.store_timeout {
            Some(limit) => tokio::time::timeout(limit, search).await.map_err(|_| {
                RetrievalError::Timeout {
                    after_ms: limit.as_millis() as u64,
                }
            })??,
            None => search.await?,
        };

        Ok(results.into_iter().map(|r| r.passage).collect())
    }
}

impl RetrievalOutcome {
    fn filtered(passages: Vec<RetrievedPassage>, attempts: Vec<RetrievalAttempt>) -> Self {
        Self {
            passages,
            filtered_used: true,
            attempts,
            safeguard_applied: false,
        }
    }
}
