use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use super::*;
use crate::cache::{CACHE_STATUS_HEADER, CacheConfig, SemanticCache};
use crate::classify::ComplianceClassifier;
use crate::embedding::{Embedder, MockEmbedder};
use crate::llm::MockLanguageModel;
use crate::retrieval::HybridRetriever;
use crate::service::ClassificationService;
use crate::vectordb::MockLawStore;

const FEATURE: &str = "Curfew login blocker for Utah minors";

fn model_reply() -> String {
    json!({
        "needs_geo_logic": "yes",
        "reasoning": "Utah Social Media Regulation Act curfew.",
        "laws": [{"name": "Utah Social Media Regulation Act", "region": "US-UT"}],
        "confidence": 0.8
    })
    .to_string()
}

struct TestApp {
    _dir: TempDir,
    llm: Arc<MockLanguageModel>,
    router: Router,
}

fn app(with_cache: bool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(8));
    let store = MockLawStore::new().with_law(
        "Minors may not access accounts between 10:30 PM and 6:30 AM.",
        "Utah Social Media Regulation Act",
        "US-UT",
        vec![1.0; 8],
    );
    let llm = Arc::new(MockLanguageModel::new([model_reply()]));

    let retriever = HybridRetriever::new(Arc::clone(&embedder), store);
    let mut service = ClassificationService::new(ComplianceClassifier::new(retriever, Arc::clone(&llm)));
    if with_cache {
        let cache = SemanticCache::open(embedder, CacheConfig::new(dir.path().join("cache.json"))).unwrap();
        service = service.with_cache(Arc::new(cache));
    }

    TestApp {
        _dir: dir,
        llm,
        router: create_router(GatewayState::new(Arc::new(service))),
    }
}

async fn post_classify(router: &Router, body: Value) -> axum::response::Response {
    post_json(router, "/classify", body).await
}

async fn post_json(router: &Router, uri: &str, body: Value) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

async fn send(router: &Router, method: &str, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn cache_header(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(CACHE_STATUS_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(false);

    let response = send(&app.router, "GET", "/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_classify_returns_result_and_miss_header() {
    let app = app(true);

    let response = post_classify(&app.router, json!({"feature_text": FEATURE})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache_header(&response), "MISS");

    let body = body_json(response).await;
    assert_eq!(body["needs_geo_logic"], "yes");
    assert_eq!(body["laws"][0]["name"], "Utah Social Media Regulation Act");
    assert_eq!(body["provenance"]["regions_inferred"], json!(["US-UT", "US"]));
    assert_eq!(body["provenance"]["region_filter_used"], true);
    assert_eq!(body["provenance"]["metrics"]["k"], 5);
    assert_eq!(body["provenance"]["metrics"]["model"], "mock-llm");
}

#[tokio::test]
async fn test_repeat_request_hits_cache() {
    let app = app(true);

    let first = post_classify(&app.router, json!({"feature_text": FEATURE})).await;
    assert_eq!(cache_header(&first), "MISS");
    let first = body_json(first).await;

    let second = post_classify(&app.router, json!({"feature_text": FEATURE})).await;
    assert_eq!(cache_header(&second), "HIT");
    assert_eq!(body_json(second).await, first);
    assert_eq!(app.llm.call_count(), 1);
}

#[tokio::test]
async fn test_auto_rules_and_region_override() {
    let app = app(false);

    let response = post_classify(
        &app.router,
        json!({
            "feature_text": FEATURE,
            "auto_rules": true,
            "regions": ["us-ut"],
            "k": 3,
            "mmr": true
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["provenance"]["rules_input"], json!(["asl", "legal_cue", "utah"]));
    assert_eq!(body["provenance"]["regions_inferred"], json!(["US-UT"]));
    assert_eq!(body["provenance"]["region_filter_used"], true);
    assert_eq!(body["provenance"]["metrics"]["mmr"], true);
}

#[tokio::test]
async fn test_short_feature_text_is_rejected() {
    let app = app(false);

    for text in ["", "x", "  y  "] {
        let response = post_classify(&app.router, json!({"feature_text": text})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "text {text:?}");

        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().contains("feature_text"));
    }
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_region_is_rejected() {
    let app = app(false);

    let response = post_classify(
        &app.router,
        json!({"feature_text": FEATURE, "regions": ["US-UT", "MARS"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("MARS"));
}

#[tokio::test]
async fn test_schema_errors_are_rejected() {
    let app = app(false);

    let missing = post_classify(&app.router, json!({"rule_hits": ["asl"]})).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let zero_k = post_classify(&app.router, json!({"feature_text": FEATURE, "k": 0})).await;
    assert_eq!(zero_k.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_model_failure_maps_to_bad_gateway() {
    let app = app(false);
    app.llm.fail_with("provider unavailable");

    let response = post_classify(&app.router, json!({"feature_text": FEATURE})).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["code"], 502);
    assert!(body["error"].as_str().unwrap().contains("provider unavailable"));
}

#[tokio::test]
async fn test_ask_returns_plain_answer_and_skips_cache() {
    let app = app(true);

    let response = post_json(
        &app.router,
        "/ask",
        json!({"question": "What does the Utah curfew require?", "regions": ["us-ut"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CACHE_STATUS_HEADER).is_none());
    assert_eq!(body_json(response).await, json!({"answer": model_reply()}));

    let prompt = &app.llm.prompts()[0];
    assert!(!prompt.json_mode);
    assert_eq!(prompt.system, crate::classify::QA_SYSTEM);
    assert!(prompt.user.contains("[1] Utah Social Media Regulation Act"));

    let stats = body_json(send(&app.router, "GET", "/cache/stats").await).await;
    assert_eq!(stats["count"], 0);
}

#[tokio::test]
async fn test_ask_validation() {
    let app = app(false);

    let short = post_json(&app.router, "/ask", json!({"question": " a "})).await;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);

    let region = post_json(
        &app.router,
        "/ask",
        json!({"question": "Which laws apply?", "regions": ["Atlantis"]}),
    )
    .await;
    assert_eq!(region.status(), StatusCode::BAD_REQUEST);

    let missing = post_json(&app.router, "/ask", json!({"k": 3})).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_ask_model_failure_maps_to_bad_gateway() {
    let app = app(false);
    app.llm.fail_with("provider unavailable");

    let response = post_json(&app.router, "/ask", json!({"question": "Which laws apply?"})).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_cache_stats_and_clear() {
    let app = app(true);

    post_classify(&app.router, json!({"feature_text": FEATURE})).await;

    let stats = send(&app.router, "GET", "/cache/stats").await;
    assert_eq!(stats.status(), StatusCode::OK);
    assert_eq!(
        body_json(stats).await,
        json!({"count": 1, "threshold": 0.95, "capacity": 1000})
    );

    let cleared = send(&app.router, "DELETE", "/cache").await;
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);

    let stats = body_json(send(&app.router, "GET", "/cache/stats").await).await;
    assert_eq!(stats["count"], 0);
}

#[tokio::test]
async fn test_cache_routes_without_cache() {
    let app = app(false);

    let stats = send(&app.router, "GET", "/cache/stats").await;
    assert_eq!(stats.status(), StatusCode::NOT_FOUND);

    let cleared = send(&app.router, "DELETE", "/cache").await;
    assert_eq!(cleared.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_body_defaults() {
    let body: ClassifyBody = serde_json::from_value(json!({"feature_text": FEATURE})).unwrap();
    let request = body.into_request().unwrap();

    assert_eq!(request.classify.k, 5);
    assert!(!request.classify.mmr);
    assert!(request.classify.rule_hits.is_empty());
    assert!(request.classify.regions.is_none());
    assert!(!request.auto_rules);
}

#[test]
fn test_ask_body_defaults() {
    let body: AskBody = serde_json::from_value(json!({"question": "Which laws apply?"})).unwrap();

    assert_eq!(body.k, 5);
    assert!(!body.mmr);
    assert_eq!(body.validate().unwrap(), None);
}
