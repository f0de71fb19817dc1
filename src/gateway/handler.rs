use std::str::FromStr;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cache::{CACHE_STATUS_HEADER, CACHE_STATUS_HIT, CACHE_STATUS_MISS};
use crate::classify::ClassifyRequest;
use crate::constants::DEFAULT_TOP_K;
use crate::gateway::error::GatewayError;
use crate::gateway::state::GatewayState;
use crate::llm::LanguageModel;
use crate::rules::Region;
use crate::service::ServiceRequest;
use crate::vectordb::LawStore;

/// Shortest accepted feature text, in characters.
pub const MIN_FEATURE_CHARS: usize = 2;

/// `POST /classify` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyBody {
    pub feature_text: String,
    #[serde(default)]
    pub rule_hits: Vec<String>,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub mmr: bool,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default)]
    pub auto_rules: bool,
}

fn default_k() -> usize {
    DEFAULT_TOP_K
}

impl ClassifyBody {
    /// Validates the body and converts it into a service request.
    pub fn into_request(self) -> Result<ServiceRequest, GatewayError> {
        if self.feature_text.trim().chars().count() < MIN_FEATURE_CHARS {
            return Err(GatewayError::InvalidRequest(format!(
                "feature_text must be at least {MIN_FEATURE_CHARS} characters"
            )));
        }
        if self.k == 0 {
            return Err(GatewayError::InvalidRequest(
                "k must be at least 1".to_string(),
            ));
        }

        let mut request = ClassifyRequest::new(self.feature_text)
            .with_rule_hits(self.rule_hits)
            .with_k(self.k)
            .with_mmr(self.mmr);

        if let Some(codes) = self.regions {
            request = request.with_regions(parse_regions(&codes)?);
        }

        Ok(ServiceRequest {
            classify: request,
            auto_rules: self.auto_rules,
        })
    }
}

/// `POST /ask` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AskBody {
    pub question: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub mmr: bool,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

impl AskBody {
    /// Validates the body, returning the parsed region filter.
    pub fn validate(&self) -> Result<Option<Vec<Region>>, GatewayError> {
        if self.question.trim().chars().count() < MIN_FEATURE_CHARS {
            return Err(GatewayError::InvalidRequest(format!(
                "question must be at least {MIN_FEATURE_CHARS} characters"
            )));
        }
        if self.k == 0 {
            return Err(GatewayError::InvalidRequest(
                "k must be at least 1".to_string(),
            ));
        }
        self.regions.as_deref().map(parse_regions).transpose()
    }
}

fn parse_regions(codes: &[String]) -> Result<Vec<Region>, GatewayError> {
    codes
        .iter()
        .map(|code| Region::from_str(code))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| GatewayError::InvalidRequest(e.to_string()))
}

#[instrument(skip(state, body))]
pub async fn classify_handler<S, M>(
    State(state): State<GatewayState<S, M>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError>
where
    S: LawStore + 'static,
    M: LanguageModel + 'static,
{
    let body: ClassifyBody = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {e}")))?;
    let request = body.into_request()?;

    let served = state.service.classify(request).await?;
    debug!(cache_hit = served.cache_hit, "Classification served");

    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(if served.cache_hit {
            CACHE_STATUS_HIT
        } else {
            CACHE_STATUS_MISS
        }),
    );

    Ok((StatusCode::OK, headers, Json(served.result)).into_response())
}

/// Grounded question answering. Answers are not cached or logged.
#[instrument(skip(state, body))]
pub async fn ask_handler<S, M>(
    State(state): State<GatewayState<S, M>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AskResponse>, GatewayError>
where
    S: LawStore + 'static,
    M: LanguageModel + 'static,
{
    let body: AskBody = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {e}")))?;
    let regions = body.validate()?;

    let answer = state
        .service
        .classifier()
        .qa_chain()
        .answer(&body.question, body.k, body.mmr, regions.as_deref())
        .await?;
    Ok(Json(AskResponse { answer }))
}

#[instrument(skip(state))]
pub async fn cache_stats_handler<S, M>(
    State(state): State<GatewayState<S, M>>,
) -> Result<Response, GatewayError>
where
    S: LawStore + 'static,
    M: LanguageModel + 'static,
{
    let stats = state
        .service
        .cache_stats()
        .ok_or(GatewayError::CacheDisabled)?;
    Ok(Json(stats).into_response())
}

#[instrument(skip(state))]
pub async fn cache_clear_handler<S, M>(
    State(state): State<GatewayState<S, M>>,
) -> Result<StatusCode, GatewayError>
where
    S: LawStore + 'static,
    M: LanguageModel + 'static,
{
    if state.service.cache().is_none() {
        return Err(GatewayError::CacheDisabled);
    }
    state.service.clear_cache().await?;
    Ok(StatusCode::NO_CONTENT)
}
