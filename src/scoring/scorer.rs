use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::embedding::Reranker;
use crate::outcome::Outcome;
use crate::vectordb::RetrievedPassage;

use super::error::ScoringError;
use super::lexical::jaccard;
use super::types::RerankInfo;

/// Pairwise (query, passage) relevance model.
pub trait RelevanceScorer: Send + Sync {
    /// One score per candidate, in input order.
    fn score_all(&self, query: &str, candidates: &[&str]) -> Result<Vec<f32>, ScoringError>;

    /// Identifier reported in provenance.
    fn model_id(&self) -> String;
}

impl RelevanceScorer for Reranker {
    fn score_all(&self, query: &str, candidates: &[&str]) -> Result<Vec<f32>, ScoringError> {
        Ok(Reranker::score_all(self, query, candidates)?)
    }

    fn model_id(&self) -> String {
        Reranker::model_id(self).unwrap_or("cross-encoder").to_string()
    }
}

/// Reranked passages plus how they were ordered.
pub type Reranked = (Vec<RetrievedPassage>, RerankInfo);

/// Best-effort passage reordering with a lexical fallback.
#[derive(Clone)]
pub struct PassageReranker {
    scorer: Option<Arc<dyn RelevanceScorer>>,
    enabled: bool,
}

impl std::fmt::Debug for PassageReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassageReranker")
            .field("scorer", &self.scorer.as_ref().map(|s| s.model_id()))
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl PassageReranker {
    pub fn new(scorer: Option<Arc<dyn RelevanceScorer>>, enabled: bool) -> Self {
        Self { scorer, enabled }
    }

    /// Reranking switched off; passages pass through untouched.
    pub fn disabled() -> Self {
        Self {
            scorer: None,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_scorer(&self) -> bool {
        self.scorer.is_some()
    }

    /// Orders `passages` by relevance to `query` and keeps `top_k`.
    ///
    /// Disabled or scorer-less rerankers return the input unchanged. A scorer error falls
    /// back to Jaccard word overlap and reports [`Outcome::Degraded`].
    pub fn rerank(
        &self,
        query: &str,
        passages: Vec<RetrievedPassage>,
        top_k: usize,
    ) -> Outcome<Reranked> {
        if !self.enabled {
            return Outcome::Ok((passages, RerankInfo::Disabled));
        }

        let Some(scorer) = &self.scorer else {
            return Outcome::degraded(
                (passages, RerankInfo::Disabled),
                "reranking enabled but no scorer is loaded",
            );
        };

        if passages.is_empty() {
            return Outcome::Ok((
                passages,
                RerankInfo::CrossEncoder {
                    model_id: scorer.model_id(),
                    scores: Vec::new(),
                },
            ));
        }

        let texts: Vec<&str> = passages.iter().map(|p| p.content.as_str()).collect();
        let scored = scorer.score_all(query, &texts).and_then(|scores| {
            if scores.len() == passages.len() {
                Ok(scores)
            } else {
                Err(ScoringError::ScoreCountMismatch {
                    expected: passages.len(),
                    actual: scores.len(),
                })
            }
        });

        match scored {
            Ok(scores) => {
                let (passages, scores) = order_by_score(passages, scores, top_k);
                debug!(
                    top_score = scores.first().copied(),
                    kept = passages.len(),
                    "Cross-encoder rerank complete"
                );
                Outcome::Ok((
                    passages,
                    RerankInfo::CrossEncoder {
                        model_id: scorer.model_id(),
                        scores,
                    },
                ))
            }
            Err(e) => {
                warn!(error = %e, "Cross-encoder failed, falling back to lexical overlap");
                let scores = passages.iter().map(|p| jaccard(query, &p.content)).collect();
                let (passages, scores) = order_by_score(passages, scores, top_k);
                Outcome::degraded(
                    (passages, RerankInfo::LexicalFallback { scores }),
                    format!("cross-encoder failed: {e}"),
                )
            }
        }
    }
}

/// Stable descending sort by score, truncated to `top_k`.
fn order_by_score(
    passages: Vec<RetrievedPassage>,
    scores: Vec<f32>,
    top_k: usize,
) -> (Vec<RetrievedPassage>, Vec<f32>) {
    let mut pairs: Vec<(RetrievedPassage, f32)> = passages.into_iter().zip(scores).collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    pairs.truncate(top_k);
    pairs.into_iter().unzip()
}
