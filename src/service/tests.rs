use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::cache::CacheConfig;
use crate::embedding::{Embedder, MockEmbedder};
use crate::llm::MockLanguageModel;
use crate::retrieval::HybridRetriever;
use crate::vectordb::MockLawStore;

const FEATURE: &str = "Age gate for Florida teens using the Online Protections for Minors law";

struct Harness {
    _dir: TempDir,
    llm: Arc<MockLanguageModel>,
    log: JsonlStream,
    service: ClassificationService<MockLawStore, MockLanguageModel>,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(8));
    let store = MockLawStore::new().with_law(
        "Platforms must terminate accounts of minors under 14.",
        "Online Protections for Minors",
        "US-FL",
        vec![1.0; 8],
    );
    let llm = Arc::new(MockLanguageModel::new([json!({
        "needs_geo_logic": "yes",
        "reasoning": "Florida HB3 applies.",
        "laws": [{"name": "Online Protections for Minors", "region": "US-FL"}],
        "confidence": 0.7
    })
    .to_string()]));

    let retriever = HybridRetriever::new(Arc::clone(&embedder), store);
    let classifier = ComplianceClassifier::new(retriever, Arc::clone(&llm));
    let cache = Arc::new(
        SemanticCache::open(
            embedder,
            CacheConfig::new(dir.path().join("cache.json")),
        )
        .unwrap(),
    );
    let log = JsonlStream::new(dir.path().join("classifications.jsonl"));

    let service = ClassificationService::new(classifier)
        .with_cache(cache)
        .with_log(log.clone());

    Harness {
        _dir: dir,
        llm,
        log,
        service,
    }
}

#[tokio::test]
async fn test_second_identical_request_hits_cache() {
    let h = harness();

    let first = h
        .service
        .classify(ClassifyRequest::new(FEATURE).into())
        .await
        .unwrap();
    assert!(!first.cache_hit);

    let second = h
        .service
        .classify(ClassifyRequest::new(FEATURE).into())
        .await
        .unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.result, first.result);
    assert_eq!(h.llm.call_count(), 1);
    assert_eq!(h.service.cache_stats().unwrap().count, 1);
}

#[tokio::test]
async fn test_fresh_result_is_logged() {
    let h = harness();

    let served = h
        .service
        .classify(ClassifyRequest::new(FEATURE).with_rule_hits(["florida"]).into())
        .await
        .unwrap();

    let records: Vec<ClassificationLogRecord> = h.log.read_latest_first().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].request_id, served.result.provenance.metrics.request_id);
    assert_eq!(records[0].rule_hits, vec!["florida"]);
    assert_eq!(records[0].response["needs_geo_logic"], "yes");

    h.service
        .classify(ClassifyRequest::new(FEATURE).into())
        .await
        .unwrap();
    let records: Vec<ClassificationLogRecord> = h.log.read_latest_first().unwrap();
    assert_eq!(records.len(), 1, "cache hits are not logged");
}

#[tokio::test]
async fn test_auto_rules_fill_empty_rule_hits() {
    let h = harness();

    let served = h
        .service
        .classify(ServiceRequest {
            classify: ClassifyRequest::new(FEATURE),
            auto_rules: true,
        })
        .await
        .unwrap();

    let rules_input = &served.result.provenance.rules_input;
    assert_eq!(rules_input, &vec!["asl", "florida", "legal_cue"]);
    assert_eq!(served.result.confidence, 0.75);
}

#[tokio::test]
async fn test_auto_rules_keep_caller_rules() {
    let h = harness();

    let served = h
        .service
        .classify(ServiceRequest {
            classify: ClassifyRequest::new(FEATURE).with_rule_hits(["pf"]),
            auto_rules: true,
        })
        .await
        .unwrap();

    assert_eq!(served.result.provenance.rules_input, vec!["pf"]);
}

#[tokio::test]
async fn test_clear_cache_forces_reclassification() {
    let h = harness();

    h.service
        .classify(ClassifyRequest::new(FEATURE).into())
        .await
        .unwrap();
    h.service.clear_cache().await.unwrap();

    let served = h
        .service
        .classify(ClassifyRequest::new(FEATURE).into())
        .await
        .unwrap();
    assert!(!served.cache_hit);
    assert_eq!(h.llm.call_count(), 2);
}

#[tokio::test]
async fn test_failure_is_not_cached() {
    let h = harness();
    h.llm.fail_with("upstream 503");

    assert!(
        h.service
            .classify(ClassifyRequest::new(FEATURE).into())
            .await
            .is_err()
    );
    assert_eq!(h.service.cache_stats().unwrap().count, 0);
    let records: Vec<ClassificationLogRecord> = h.log.read_latest_first().unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_service_without_cache_or_log() {
    let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(8));
    let retriever = HybridRetriever::new(embedder, MockLawStore::new());
    let llm = Arc::new(MockLanguageModel::new([r#"{"needs_geo_logic":"no"}"#]));
    let service = ClassificationService::new(ComplianceClassifier::new(retriever, llm));

    let served = service
        .classify(ClassifyRequest::new("Dark mode").into())
        .await
        .unwrap();
    assert!(!served.cache_hit);
    assert!(service.cache_stats().is_none());
    service.clear_cache().await.unwrap();
}
