//! HTTP gateway (Axum) over the classification service.
//!
//! Routes: `GET /healthz`, `POST /classify`, `POST /ask`, `GET /cache/stats`, `DELETE /cache`.

pub mod error;
pub mod handler;
pub mod state;

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ErrorResponse, GatewayError};
pub use handler::{
    AskBody, AskResponse, ClassifyBody, MIN_FEATURE_CHARS, ask_handler, cache_clear_handler,
    cache_stats_handler, classify_handler,
};
pub use state::GatewayState;

use crate::llm::LanguageModel;
use crate::vectordb::LawStore;

pub fn create_router<S, M>(state: GatewayState<S, M>) -> Router
where
    S: LawStore + 'static,
    M: LanguageModel + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/classify", post(classify_handler::<S, M>))
        .route("/ask", post(ask_handler::<S, M>))
        .route("/cache/stats", get(cache_stats_handler::<S, M>))
        .route("/cache", delete(cache_clear_handler::<S, M>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}
