use serde::{Deserialize, Serialize};

/// How retrieved passages were ordered. Serialized under a `method` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RerankInfo {
    /// Passages kept in store order.
    Disabled,
    /// Ordered by cross-encoder relevance.
    CrossEncoder {
        /// Scorer identifier.
        model_id: String,
        /// Scores of the returned passages, in output order.
        scores: Vec<f32>,
    },
    /// Ordered by query/passage word-set Jaccard after a scorer failure.
    LexicalFallback {
        /// Scores of the returned passages, in output order.
        scores: Vec<f32>,
    },
}

impl RerankInfo {
    /// Wire name of the method.
    pub fn method(&self) -> &'static str {
        match self {
            RerankInfo::Disabled => "disabled",
            RerankInfo::CrossEncoder { .. } => "cross_encoder",
            RerankInfo::LexicalFallback { .. } => "lexical_fallback",
        }
    }

    /// Returns the scores (if any).
    pub fn scores(&self) -> Option<&[f32]> {
        match self {
            RerankInfo::Disabled => None,
            RerankInfo::CrossEncoder { scores, .. } | RerankInfo::LexicalFallback { scores } => {
                Some(scores)
            }
        }
    }
}

impl std::fmt::Display for RerankInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method())
    }
}
