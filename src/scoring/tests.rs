use std::sync::Arc;

use super::*;
use crate::embedding::Reranker;
use crate::vectordb::{PassageMetadata, RetrievedPassage};

struct FixedScorer(Vec<f32>);

impl RelevanceScorer for FixedScorer {
    fn score_all(&self, _query: &str, _candidates: &[&str]) -> Result<Vec<f32>, ScoringError> {
        Ok(self.0.clone())
    }

    fn model_id(&self) -> String {
        "fixed".to_string()
    }
}

struct FailingScorer;

impl RelevanceScorer for FailingScorer {
    fn score_all(&self, _query: &str, _candidates: &[&str]) -> Result<Vec<f32>, ScoringError> {
        Err(ScoringError::ComputationFailed {
            reason: "out of memory".to_string(),
        })
    }

    fn model_id(&self) -> String {
        "failing".to_string()
    }
}

fn passage(content: &str) -> RetrievedPassage {
    RetrievedPassage::new(content, PassageMetadata::default())
}

fn contents(passages: &[RetrievedPassage]) -> Vec<&str> {
    passages.iter().map(|p| p.content.as_str()).collect()
}

fn sample() -> Vec<RetrievedPassage> {
    vec![
        passage("data retention schedule"),
        passage("curfew for minors in utah"),
        passage("utah minors"),
    ]
}

#[test]
fn test_disabled_returns_input_unchanged() {
    let reranker = PassageReranker::disabled();
    let outcome = reranker.rerank("utah minors", sample(), 1);

    assert!(!outcome.is_degraded());
    let (passages, info) = outcome.into_value();
    assert_eq!(passages, sample());
    assert_eq!(info, RerankInfo::Disabled);
}

#[test]
fn test_missing_scorer_degrades_to_disabled() {
    let reranker = PassageReranker::new(None, true);
    let outcome = reranker.rerank("utah minors", sample(), 2);

    assert!(outcome.is_degraded());
    let (passages, info) = outcome.into_value();
    assert_eq!(passages.len(), 3);
    assert_eq!(info.method(), "disabled");
}

#[test]
fn test_cross_encoder_orders_and_truncates() {
    let reranker = PassageReranker::new(Some(Arc::new(FixedScorer(vec![0.1, 0.7, 0.9]))), true);
    let outcome = reranker.rerank("utah minors", sample(), 2);

    assert!(!outcome.is_degraded());
    let (passages, info) = outcome.into_value();
    assert_eq!(
        contents(&passages),
        vec!["utah minors", "curfew for minors in utah"]
    );
    assert_eq!(
        info,
        RerankInfo::CrossEncoder {
            model_id: "fixed".to_string(),
            scores: vec![0.9, 0.7],
        }
    );
}

#[test]
fn test_score_count_mismatch_falls_back() {
    let reranker = PassageReranker::new(Some(Arc::new(FixedScorer(vec![0.5]))), true);
    let outcome = reranker.rerank("utah minors", sample(), 3);

    assert!(outcome.is_degraded());
    assert_eq!(outcome.value().1.method(), "lexical_fallback");
}

#[test]
fn test_scorer_failure_uses_jaccard() {
    let reranker = PassageReranker::new(Some(Arc::new(FailingScorer)), true);
    let outcome = reranker.rerank("utah minors", sample(), 2);

    assert!(outcome.is_degraded());
    assert!(outcome.reason().unwrap().contains("out of memory"));

    let (passages, info) = outcome.into_value();
    assert_eq!(
        contents(&passages),
        vec!["utah minors", "curfew for minors in utah"]
    );
    match info {
        RerankInfo::LexicalFallback { scores } => {
            assert_eq!(scores[0], 1.0);
            assert!((scores[1] - 0.4).abs() < 1e-6);
        }
        other => panic!("unexpected info: {other:?}"),
    }
}

#[test]
fn test_lexical_sort_is_stable_on_ties() {
    let reranker = PassageReranker::new(Some(Arc::new(FailingScorer)), true);
    let passages = vec![passage("alpha"), passage("beta"), passage("gamma")];
    let (ordered, _) = reranker.rerank("delta", passages, 3).into_value();

    assert_eq!(contents(&ordered), vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_unloaded_cross_encoder_triggers_fallback() {
    let reranker = PassageReranker::new(Some(Arc::new(Reranker::unloaded())), true);
    let outcome = reranker.rerank("utah minors", sample(), 3);

    assert!(outcome.is_degraded());
    assert_eq!(outcome.value().1.method(), "lexical_fallback");
}

#[test]
fn test_rerank_info_wire_format() {
    let info = RerankInfo::CrossEncoder {
        model_id: "bge-reranker".to_string(),
        scores: vec![0.5],
    };
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["method"], "cross_encoder");
    assert_eq!(json["model_id"], "bge-reranker");

    let json = serde_json::to_value(RerankInfo::Disabled).unwrap();
    assert_eq!(json, serde_json::json!({ "method": "disabled" }));
}
