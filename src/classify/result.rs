use serde::{Deserialize, Serialize};

use super::schema::{LawReference, Verdict};
use crate::rules::Region;
use crate::scoring::RerankInfo;

/// Final classification with its audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub needs_geo_logic: Verdict,
    pub reasoning: String,
    pub laws: Vec<LawReference>,
    /// Calibrated, in `[0.2, 0.95]`.
    pub confidence: f64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Rule hits supplied by the caller.
    pub rules_input: Vec<String>,
    /// Sorted union of model-reported and caller-supplied rule hits.
    pub rules_hit: Vec<String>,
    pub retrieved_law_ids: Vec<String>,
    pub regions_inferred: Vec<Region>,
    pub region_filter_used: bool,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub latency_ms: u64,
    pub k: usize,
    pub mmr: bool,
    pub rerank: RerankInfo,
    pub model: String,
    pub request_id: String,
}
