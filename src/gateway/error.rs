use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::CacheError;
use crate::classify::ClassifyError;
use crate::retrieval::RetrievalError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("semantic cache is not configured")]
    CacheDisabled,

    #[error("classification failed: {0}")]
    Classification(#[from] ClassifyError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::CacheDisabled => StatusCode::NOT_FOUND,
            GatewayError::Classification(e) => match e {
                ClassifyError::Timeout { .. }
                | ClassifyError::Retrieval(RetrievalError::Timeout { .. }) => {
                    StatusCode::GATEWAY_TIMEOUT
                }
                ClassifyError::Retrieval(RetrievalError::Store(_)) | ClassifyError::Llm(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ClassifyError::Retrieval(_) | ClassifyError::TaskFailed { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            GatewayError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
