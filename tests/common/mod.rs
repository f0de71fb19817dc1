//! Test server harness and HTTP client.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use geocomply::cache::{CACHE_STATUS_HEADER, CacheConfig, SemanticCache};
use geocomply::classify::ComplianceClassifier;
use geocomply::embedding::{Embedder, MockEmbedder};
use geocomply::fewshot::{ExampleSelector, FewShotConfig, JsonlStream};
use geocomply::gateway::{GatewayState, create_router};
use geocomply::llm::MockLanguageModel;
use geocomply::retrieval::HybridRetriever;
use geocomply::service::ClassificationService;
use geocomply::vectordb::MockLawStore;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const EMBEDDING_DIM: usize = 16;
const STARTUP_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Small law corpus: one passage per region.
pub fn law_store() -> MockLawStore {
    let mut store = MockLawStore::new();
    let laws = [
        (
            "Minors may not hold accounts active between 10:30 PM and 6:30 AM.",
            "Utah Social Media Regulation Act",
            "US-UT",
        ),
        (
            "Platforms must terminate accounts held by minors under 14.",
            "Online Protections for Minors",
            "US-FL",
        ),
        (
            "Providers shall not serve addictive feeds to minors without parental consent.",
            "Protecting Our Kids from Social Media Addiction Act",
            "US-CA",
        ),
        (
            "Online platforms shall put in place measures to ensure privacy and safety of minors.",
            "Digital Services Act",
            "EU",
        ),
        (
            "Providers shall report apparent child sexual exploitation to NCMEC.",
            "18 U.S.C. 2258A",
            "US",
        ),
    ];
    for (i, (content, law, region)) in laws.into_iter().enumerate() {
        let mut vector = vec![0.1; EMBEDDING_DIM];
        vector[i] = 1.0;
        store = store.with_law(content, law, region, vector);
    }
    store
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub llm: Arc<MockLanguageModel>,
    pub log_path: PathBuf,
    pub feedback_path: PathBuf,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns a server with every collaborator mocked: in-memory law store, scripted model,
/// hash-seeded embedder, and cache/log/feedback files in a temp dir.
pub async fn spawn_test_server(responses: Vec<String>) -> TestServer {
    let temp_dir = TempDir::new().expect("temp dir");
    let log_path = temp_dir.path().join("classifications.jsonl");
    let feedback_path = temp_dir.path().join("feedback.jsonl");

    let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(EMBEDDING_DIM));
    let llm = Arc::new(MockLanguageModel::new(responses));
    let log = JsonlStream::new(&log_path);
    let selector = ExampleSelector::new(JsonlStream::new(&feedback_path), log.clone());

    let retriever = HybridRetriever::new(Arc::clone(&embedder), law_store())
        .with_store_timeout(Duration::from_secs(2));
    let classifier = ComplianceClassifier::new(retriever, Arc::clone(&llm))
        .with_examples(selector, FewShotConfig::default())
        .with_llm_timeout(Duration::from_secs(2));

    let cache = SemanticCache::open(
        embedder,
        CacheConfig::new(temp_dir.path().join("semantic_cache.json")),
    )
    .expect("cache");
    let service = ClassificationService::new(classifier)
        .with_cache(Arc::new(cache))
        .with_log(log);

    let app = create_router(GatewayState::new(Arc::new(service)));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    wait_for_server_ready(addr).await;

    TestServer {
        addr,
        llm,
        log_path,
        feedback_path,
        _server_handle: handle,
        shutdown_tx: Some(shutdown_tx),
        _temp_dir: temp_dir,
    }
}

async fn wait_for_server_ready(addr: SocketAddr) {
    let start = std::time::Instant::now();
    while start.elapsed() < STARTUP_WAIT_TIMEOUT {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
    }
    panic!("server at {addr} did not start");
}

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns `(status, cache header, body)`.
    pub async fn classify(&self, body: Value) -> (u16, Option<String>, Value) {
        let resp = self
            .client
            .post(self.url("/classify"))
            .json(&body)
            .send()
            .await
            .expect("request");

        let status = resp.status().as_u16();
        let cache = resp
            .headers()
            .get(CACHE_STATUS_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        let body = resp.json().await.expect("json body");
        (status, cache, body)
    }

    pub async fn ask(&self, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url("/ask"))
            .json(&body)
            .send()
            .await
            .expect("request");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("json body"))
    }

    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.expect("request");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("json body"))
    }

    pub async fn delete(&self, path: &str) -> u16 {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("request");
        resp.status().as_u16()
    }
}
