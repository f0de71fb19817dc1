//! Geocomply HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use geocomply::classify::ComplianceClassifier;
use geocomply::config::{Config, DEFAULT_PORT};
use geocomply::constants::validate_embedding_dim;
use geocomply::embedding::{DenseEmbedder, Embedder, Reranker};
use geocomply::fewshot::{ExampleSelector, JsonlStream};
use geocomply::gateway::{GatewayState, create_router};
use geocomply::llm::GenaiModel;
use geocomply::retrieval::HybridRetriever;
use geocomply::scoring::{PassageReranker, RelevanceScorer};
use geocomply::service::{ClassificationService, ResultCache};
use geocomply::vectordb::QdrantLawStore;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!(
        r#"
  ___ ___ ___   ___ ___  __  __ ___ _ __   __
 / __| __/ _ \ / __/ _ \|  \/  | _ \ |\ \ / /
| (_ | _| (_) | (_| (_) | |\/| |  _/ |_\ V /
 \___|___\___/ \___\___/|_|  |_|_| |____|_|

        WHERE DOES THIS FEATURE NEED LAW?
                                        AGPL-3.0
"#
    );

    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        model = %config.llm_model,
        "Geocomply starting"
    );

    let embedder: Arc<dyn Embedder> = Arc::new(DenseEmbedder::load(config.embedder_config())?);
    validate_embedding_dim(embedder.embedding_dim(), config.embedding_dim)?;

    let store = QdrantLawStore::new(&config.qdrant_url, &config.collection)?;
    if let Err(e) = store.health_check().await {
        tracing::warn!(error = %e, url = %config.qdrant_url, "Law store not reachable yet");
    }

    let scorer: Option<Arc<dyn RelevanceScorer>> = match Reranker::load(config.reranker_config()) {
        Ok(reranker) if reranker.is_model_loaded() => {
            Some(Arc::new(reranker) as Arc<dyn RelevanceScorer>)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Reranker unavailable, using lexical fallback");
            None
        }
    };

    let llm = Arc::new(GenaiModel::new(config.llm_config())?);

    let retriever =
        HybridRetriever::new(Arc::clone(&embedder), store).with_store_timeout(config.store_timeout());
    let log = JsonlStream::new(config.log_path.clone());
    let selector = ExampleSelector::new(JsonlStream::new(config.feedback_path.clone()), log.clone());

    let classifier = ComplianceClassifier::new(retriever, llm)
        .with_reranker(PassageReranker::new(scorer, config.rerank))
        .with_examples(selector, config.few_shot_config())
        .with_llm_timeout(config.llm_timeout());

    let cache = Arc::new(ResultCache::open(embedder, config.cache_config())?);
    let service = ClassificationService::new(classifier)
        .with_cache(Arc::clone(&cache))
        .with_log(log);

    let app = create_router(GatewayState::new(Arc::new(service)));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Persisting semantic cache...");
    let persisted = tokio::task::spawn_blocking(move || cache.persist()).await?;
    if let Err(e) = persisted {
        tracing::error!(error = %e, "Failed to persist semantic cache");
    }

    tracing::info!("Geocomply shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var(Config::ENV_PORT)
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let url = format!("http://127.0.0.1:{port}/healthz");

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
