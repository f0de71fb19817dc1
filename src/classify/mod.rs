//! Classification chain.
//!
//! Per request, in order: region inference, retrieval cascade, rerank, few-shot selection,
//! prompt assembly, model call, lenient JSON parse, coercion, confidence calibration.
//!
//! [`QaChain`] shares the retriever, reranker and model for grounded question answering.

mod calibrate;
mod error;
mod parse;
mod prompt;
mod qa;
mod result;
mod schema;


pub use calibrate::{MEANINGFUL_RULES, calibrate};
pub use error::ClassifyError;
pub use parse::parse_model_output;
pub use prompt::{CLASSIFY_SYSTEM, build_user_prompt, format_context};
pub use qa::{NO_ANSWER, QA_SYSTEM, QaChain, build_qa_prompt};
pub use result::{ClassificationResult, Metrics, Provenance};
pub use schema::{DEFAULT_MODEL_CONFIDENCE, LawReference, ModelVerdict, Verdict};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::constants::DEFAULT_TOP_K;
use crate::fewshot::{ExampleSelector, FewShotConfig, render_examples};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::retrieval::{HybridRetriever, RetrievalError};
use crate::rules::{Region, infer_regions};
use crate::scoring::{PassageReranker, RerankInfo};
use crate::vectordb::{LawStore, RetrievedPassage};

/// Input to [`ComplianceClassifier::classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyRequest {
    pub feature_text: String,
    pub rule_hits: Vec<String>,
    pub k: usize,
    pub mmr: bool,
    /// Overrides region inference when set.
    pub regions: Option<Vec<Region>>,
}

impl ClassifyRequest {
    pub fn new(feature_text: impl Into<String>) -> Self {
        Self {
            feature_text: feature_text.into(),
            rule_hits: Vec::new(),
            k: DEFAULT_TOP_K,
            mmr: false,
            regions: None,
        }
    }

    pub fn with_rule_hits(mut self, rule_hits: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.rule_hits = rule_hits.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_mmr(mut self, mmr: bool) -> Self {
        self.mmr = mmr;
        self
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = Some(regions);
        self
    }
}

/// Retrieval-augmented classifier over a law store and a language model.
pub struct ComplianceClassifier<S, M> {
    retriever: HybridRetriever<S>,
    reranker: PassageReranker,
    selector: Option<ExampleSelector>,
    few_shot: FewShotConfig,
    llm: Arc<M>,
    llm_timeout: Option<Duration>,
}

impl<S: LawStore, M: LanguageModel> ComplianceClassifier<S, M> {
    pub fn new(retriever: HybridRetriever<S>, llm: Arc<M>) -> Self {
        Self {
            retriever,
            reranker: PassageReranker::disabled(),
            selector: None,
            few_shot: FewShotConfig::disabled(),
            llm,
            llm_timeout: None,
        }
    }

    pub fn with_reranker(mut self, reranker: PassageReranker) -> Self {
        self.reranker = reranker;
        self
    }

    pub fn with_examples(mut self, selector: ExampleSelector, config: FewShotConfig) -> Self {
        self.selector = Some(selector);
        self.few_shot = config;
        self
    }

    /// Bounds every model call.
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    pub fn retriever(&self) -> &HybridRetriever<S> {
        &self.retriever
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Question answering over this classifier's collaborators.
    pub fn qa_chain(&self) -> QaChain<'_, S, M> {
        QaChain::new(&self.retriever, &self.reranker, &self.llm, self.llm_timeout)
    }

    #[instrument(skip(self, request), fields(k = request.k, mmr = request.mmr))]
    pub async fn classify(
        &self,
        request: ClassifyRequest,
    ) -> Result<ClassificationResult, ClassifyError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let k = request.k.max(1);

        let regions = match &request.regions {
            Some(regions) => dedup_regions(regions),
            None => infer_regions(&request.feature_text),
        };

        let retrieved = self
            .retriever
            .retrieve_with_cascade(&request.feature_text, k, request.mmr, &regions)
            .await
            .map_err(|e| match e {
                RetrievalError::Timeout { after_ms } => ClassifyError::Timeout {
                    stage: "law store search",
                    after_ms,
                },
                other => ClassifyError::Retrieval(other),
            })?;
        let filter_used = retrieved.filtered_used;

        let (passages, rerank) =
            rerank_passages(&self.reranker, &request.feature_text, retrieved.passages, k).await?;

        let examples = self.examples().await;
        let context = format_context(&passages);
        let user = build_user_prompt(&request.feature_text, &request.rule_hits, &context, &examples);

        let raw = complete_bounded(
            &*self.llm,
            self.llm_timeout,
            CompletionRequest::new(CLASSIFY_SYSTEM, user).json(),
        )
        .await?;

        let parsed = parse_model_output(&raw);
        if let Some(reason) = parsed.reason() {
            warn!(request_id = %request_id, reason, "Model output needed recovery");
        }
        let verdict = ModelVerdict::from_value(parsed.value());

        let rules_hit: Vec<String> = verdict
            .rules_hit
            .iter()
            .chain(request.rule_hits.iter())
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let retrieved_law_ids: Vec<String> = passages
            .iter()
            .filter_map(|p| p.metadata.law_id())
            .collect();

        let confidence = calibrate(verdict.confidence, &rules_hit, &regions, filter_used);
        let latency_ms = started.elapsed().as_millis() as u64;

        info!(
            request_id = %request_id,
            verdict = %verdict.verdict,
            confidence,
            passages = passages.len(),
            filter_used,
            latency_ms,
            "Classification complete"
        );

        Ok(ClassificationResult {
            needs_geo_logic: verdict.verdict,
            reasoning: verdict.reasoning,
            laws: verdict.laws,
            confidence,
            provenance: Provenance {
                rules_input: request.rule_hits,
                rules_hit,
                retrieved_law_ids,
                regions_inferred: regions,
                region_filter_used: filter_used,
                metrics: Metrics {
                    latency_ms,
                    k,
                    mmr: request.mmr,
                    rerank,
                    model: self.llm.model_id().to_string(),
                    request_id,
                },
            },
        })
    }

    async fn examples(&self) -> String {
        let Some(selector) = &self.selector else {
            return String::new();
        };
        if !self.few_shot.enabled {
            return String::new();
        }

        let selector = selector.clone();
        let (max_pos, max_neg) = (self.few_shot.max_positive, self.few_shot.max_negative);
        let examples = match tokio::task::spawn_blocking(move || selector.select(max_pos, max_neg))
            .await
        {
            Ok(outcome) => outcome.into_value(),
            Err(e) => {
                warn!(error = %e, "Few-shot selection task failed");
                Vec::new()
            }
        };

        let rendered = render_examples(&examples);
        debug!(count = examples.len(), examples = %rendered, "Few-shot block");
        rendered
    }
}

async fn rerank_passages(
    reranker: &PassageReranker,
    query: &str,
    passages: Vec<RetrievedPassage>,
    k: usize,
) -> Result<(Vec<RetrievedPassage>, RerankInfo), ClassifyError> {
    if !reranker.is_enabled() {
        return Ok((passages, RerankInfo::Disabled));
    }

    let reranker = reranker.clone();
    let query = query.to_string();
    let outcome = tokio::task::spawn_blocking(move || reranker.rerank(&query, passages, k))
        .await
        .map_err(|e| ClassifyError::TaskFailed {
            stage: "rerank",
            reason: e.to_string(),
        })?;

    if let Some(reason) = outcome.reason() {
        warn!(reason, "Rerank degraded");
    }
    Ok(outcome.into_value())
}

async fn complete_bounded<M: LanguageModel>(
    llm: &M,
    timeout: Option<Duration>,
    request: CompletionRequest,
) -> Result<String, ClassifyError> {
    let call = llm.complete(request);
    let text = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, call).await.map_err(|_| {
            ClassifyError::Timeout {
                stage: "language model",
                after_ms: timeout.as_millis() as u64,
            }
        })??,
        None => call.await?,
    };
    Ok(text)
}

fn dedup_regions(regions: &[Region]) -> Vec<Region> {
    let mut out = Vec::with_capacity(regions.len());
    for region in regions {
        if !out.contains(region) {
            out.push(*region);
        }
    }
    out
}
