//! Serving layer: semantic cache around the classifier plus the classification log.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheError, CacheStats, SemanticCache};
use crate::classify::{ClassificationResult, ClassifyError, ClassifyRequest, ComplianceClassifier};
use crate::fewshot::{ClassificationLogRecord, JsonlStream};
use crate::llm::LanguageModel;
use crate::rules::infer_rule_hits;
use crate::vectordb::LawStore;

/// Shared response cache type.
pub type ResultCache = SemanticCache<ClassificationResult>;

/// Service-level request: a classification request plus serving options.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub classify: ClassifyRequest,
    /// Fill `rule_hits` from the rule table when the caller sent none.
    pub auto_rules: bool,
}

impl From<ClassifyRequest> for ServiceRequest {
    fn from(classify: ClassifyRequest) -> Self {
        Self {
            classify,
            auto_rules: false,
        }
    }
}

/// Classification served from or written to the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    pub result: ClassificationResult,
    pub cache_hit: bool,
}

pub struct ClassificationService<S, M> {
    classifier: ComplianceClassifier<S, M>,
    cache: Option<Arc<ResultCache>>,
    log: Option<JsonlStream>,
}

impl<S: LawStore, M: LanguageModel> ClassificationService<S, M> {
    pub fn new(classifier: ComplianceClassifier<S, M>) -> Self {
        Self {
            classifier,
            cache: None,
            log: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Appends every fresh classification to `log`.
    pub fn with_log(mut self, log: JsonlStream) -> Self {
        self.log = Some(log);
        self
    }

    pub fn classifier(&self) -> &ComplianceClassifier<S, M> {
        &self.classifier
    }

    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    /// Serves from the cache when a similar feature text was seen, otherwise classifies,
    /// logs and caches. Cache and log failures are logged and never fail the request.
    #[instrument(skip(self, request), fields(auto_rules = request.auto_rules))]
    pub async fn classify(&self, request: ServiceRequest) -> Result<Served, ClassifyError> {
        let ServiceRequest {
            classify: mut request,
            auto_rules,
        } = request;

        if auto_rules && request.rule_hits.is_empty() {
            request.rule_hits = infer_rule_hits(&request.feature_text).into_iter().collect();
            debug!(rules = ?request.rule_hits, "Inferred rule hits");
        }

        if let Some(result) = self.cached(&request.feature_text).await {
            info!(request_id = %result.provenance.metrics.request_id, "Served from semantic cache");
            return Ok(Served {
                result,
                cache_hit: true,
            });
        }

        let feature_text = request.feature_text.clone();
        let rule_hits = request.rule_hits.clone();
        let result = self.classifier.classify(request).await?;

        self.append_log(&feature_text, rule_hits, &result).await;
        self.store(&feature_text, &result).await;

        Ok(Served {
            result,
            cache_hit: false,
        })
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Clears the cache, if one is configured.
    pub async fn clear_cache(&self) -> Result<(), CacheError> {
        let Some(cache) = self.cache.clone() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || cache.clear())
            .await
            .map_err(|e| CacheError::TaskFailed {
                reason: e.to_string(),
            })?
    }

    async fn cached(&self, key: &str) -> Option<ClassificationResult> {
        let cache = self.cache.clone()?;
        let key = key.to_string();
        match tokio::task::spawn_blocking(move || cache.get(&key)).await {
            Ok(Ok(hit)) => hit,
            Ok(Err(e)) => {
                warn!(error = %e, "Semantic cache lookup failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "Semantic cache task failed");
                None
            }
        }
    }

    async fn store(&self, key: &str, result: &ClassificationResult) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let key = key.to_string();
        let result = result.clone();
        match tokio::task::spawn_blocking(move || cache.set(&key, result)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Semantic cache write failed"),
            Err(e) => warn!(error = %e, "Semantic cache task failed"),
        }
    }

    async fn append_log(&self, feature_text: &str, rule_hits: Vec<String>, result: &ClassificationResult) {
        let Some(log) = self.log.clone() else {
            return;
        };

        let response = match serde_json::to_value(result) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Classification result not serializable for log");
                return;
            }
        };
        let record = ClassificationLogRecord {
            request_id: result.provenance.metrics.request_id.clone(),
            feature_text: feature_text.to_string(),
            rule_hits,
            response,
            timestamp: Utc::now(),
        };

        match tokio::task::spawn_blocking(move || log.append(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Classification log append failed"),
            Err(e) => warn!(error = %e, "Classification log task failed"),
        }
    }
}
