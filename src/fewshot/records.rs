use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Verdict;

/// Reviewer vote on a past classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

/// One line of the feedback stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub request_id: String,
    pub vote: Vote,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl FeedbackRecord {
    pub fn new(request_id: impl Into<String>, vote: Vote) -> Self {
        Self {
            request_id: request_id.into(),
            vote,
            note: None,
            corrected_verdict: None,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_corrected_verdict(mut self, verdict: Verdict) -> Self {
        self.corrected_verdict = Some(verdict);
        self
    }
}

/// One line of the classification log.
///
/// `response` is kept as raw JSON so older result shapes stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationLogRecord {
    pub request_id: String,
    pub feature_text: String,
    #[serde(default)]
    pub rule_hits: Vec<String>,
    pub response: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
