//! Few-shot example mining from reviewer feedback.
//!
//! Up-voted past classifications become `GOOD` examples and down-voted ones become `AVOID`
//! examples. Examples are recomputed on every request from two append-only streams: the
//! feedback stream and the classification log. Any read failure yields an empty set.

mod error;
mod records;
mod stream;


pub use error::StreamError;
pub use records::{ClassificationLogRecord, FeedbackRecord, Vote};
pub use stream::JsonlStream;

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::outcome::Outcome;

/// Max characters of feature text shown per example.
pub const FEATURE_PREVIEW_CHARS: usize = 200;

/// Law references kept in a trimmed example response.
pub const EXAMPLE_LAW_LIMIT: usize = 2;

/// Few-shot settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FewShotConfig {
    pub enabled: bool,
    pub max_positive: usize,
    pub max_negative: usize,
}

impl Default for FewShotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_positive: 1,
            max_negative: 1,
        }
    }
}

impl FewShotConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_quotas(mut self, max_positive: usize, max_negative: usize) -> Self {
        self.max_positive = max_positive;
        self.max_negative = max_negative;
        self
    }
}

/// Whether an example shows behavior to repeat or to avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn label(&self) -> &'static str {
        match self {
            Polarity::Positive => "GOOD",
            Polarity::Negative => "AVOID",
        }
    }
}

/// A past classification reshaped for the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct FewShotExample {
    pub polarity: Polarity,
    pub request_id: String,
    pub feature_text: String,
    pub rule_hits: Vec<String>,
    /// `needs_geo_logic`, `reasoning`, `confidence` and the first two `laws`.
    pub response: Value,
    pub note: Option<String>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Mines examples from the feedback stream and classification log.
#[derive(Debug, Clone)]
pub struct ExampleSelector {
    feedback: JsonlStream,
    log: JsonlStream,
}

impl ExampleSelector {
    pub fn new(feedback: JsonlStream, log: JsonlStream) -> Self {
        Self { feedback, log }
    }

    pub fn feedback_stream(&self) -> &JsonlStream {
        &self.feedback
    }

    pub fn log_stream(&self) -> &JsonlStream {
        &self.log
    }

    /// Selects up to `max_positive` GOOD and `max_negative` AVOID examples.
    ///
    /// Positives come first, then negatives, each newest first. No two examples share a
    /// normalized rule-hit set.
    pub fn select(&self, max_positive: usize, max_negative: usize) -> Outcome<Vec<FewShotExample>> {
        if max_positive == 0 && max_negative == 0 {
            return Outcome::Ok(Vec::new());
        }

        match self.try_select(max_positive, max_negative) {
            Ok(examples) => {
                debug!(count = examples.len(), "Selected few-shot examples");
                Outcome::Ok(examples)
            }
            Err(e) => {
                warn!(error = %e, "Few-shot examples unavailable");
                Outcome::degraded(Vec::new(), e.to_string())
            }
        }
    }

    fn try_select(
        &self,
        max_positive: usize,
        max_negative: usize,
    ) -> Result<Vec<FewShotExample>, StreamError> {
        let feedback: Vec<FeedbackRecord> = self.feedback.read_latest_first()?;
        let (mut pending_up, mut pending_down) =
            latest_votes(feedback, max_positive * 2, max_negative * 2);

        if pending_up.is_empty() && pending_down.is_empty() {
            return Ok(Vec::new());
        }

        let log: Vec<ClassificationLogRecord> = self.log.read_latest_first()?;

        let mut positives = Vec::new();
        let mut negatives = Vec::new();
        let mut used_rule_sets: HashSet<Vec<String>> = HashSet::new();

        for entry in log {
            if positives.len() >= max_positive && negatives.len() >= max_negative {
                break;
            }

            let (polarity, feedback) = if positives.len() < max_positive
                && pending_up.contains_key(&entry.request_id)
            {
                (Polarity::Positive, &mut pending_up)
            } else if negatives.len() < max_negative && pending_down.contains_key(&entry.request_id)
            {
                (Polarity::Negative, &mut pending_down)
            } else {
                continue;
            };

            let rule_key = normalize_rules(&entry.rule_hits);
            if used_rule_sets.contains(&rule_key) {
                continue;
            }

            let Some(record) = feedback.remove(&entry.request_id) else {
                continue;
            };
            used_rule_sets.insert(rule_key);

            let example = build_example(polarity, entry, record.note);
            match polarity {
                Polarity::Positive => positives.push(example),
                Polarity::Negative => negatives.push(example),
            }
        }

        positives.extend(negatives);
        Ok(positives)
    }
}

/// Latest vote per request id, capped per polarity.
fn latest_votes(
    feedback: Vec<FeedbackRecord>,
    up_cap: usize,
    down_cap: usize,
) -> (
    HashMap<String, FeedbackRecord>,
    HashMap<String, FeedbackRecord>,
) {
    let mut seen = HashSet::new();
    let mut up = HashMap::new();
    let mut down = HashMap::new();

    for record in feedback {
        if up.len() >= up_cap && down.len() >= down_cap {
            break;
        }
        if !seen.insert(record.request_id.clone()) {
            continue;
        }
        match record.vote {
            Vote::Up if up.len() < up_cap => {
                up.insert(record.request_id.clone(), record);
            }
            Vote::Down if down.len() < down_cap => {
                down.insert(record.request_id.clone(), record);
            }
            _ => {}
        }
    }

    (up, down)
}

/// Trimmed, lowercased, deduplicated and sorted rule tags.
fn normalize_rules(rules: &[String]) -> Vec<String> {
    rules
        .iter()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn build_example(
    polarity: Polarity,
    entry: ClassificationLogRecord,
    note: Option<String>,
) -> FewShotExample {
    let response = trim_response(&entry.response);
    let confidence = response
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    FewShotExample {
        polarity,
        request_id: entry.request_id,
        feature_text: entry.feature_text,
        rule_hits: entry.rule_hits,
        response,
        note: note.filter(|n| !n.trim().is_empty()),
        confidence,
        timestamp: entry.timestamp,
    }
}

fn trim_response(response: &Value) -> Value {
    let mut trimmed = Map::new();
    for key in ["needs_geo_logic", "reasoning", "confidence"] {
        if let Some(value) = response.get(key) {
            trimmed.insert(key.to_string(), value.clone());
        }
    }

    let laws: Vec<Value> = response
        .get("laws")
        .and_then(Value::as_array)
        .map(|laws| laws.iter().take(EXAMPLE_LAW_LIMIT).cloned().collect())
        .unwrap_or_default();
    trimmed.insert("laws".to_string(), Value::Array(laws));

    Value::Object(trimmed)
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(FEATURE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Renders examples as a prompt block. Empty input renders as an empty string.
pub fn render_examples(examples: &[FewShotExample]) -> String {
    if examples.is_empty() {
        return String::new();
    }

    let mut out = String::from(
        "Reviewed examples (GOOD = confirmed correct, follow it; AVOID = confirmed incorrect, do not repeat it):\n",
    );

    for (i, example) in examples.iter().enumerate() {
        let rules = if example.rule_hits.is_empty() {
            "none".to_string()
        } else {
            example.rule_hits.join(", ")
        };
        let response =
            serde_json::to_string(&example.response).unwrap_or_else(|_| "{}".to_string());

        out.push_str(&format!(
            "\nExample {} [{}] (confidence {:.2})\nFeature: {}\nRules: {}\nResponse: {}\n",
            i + 1,
            example.polarity.label(),
            example.confidence,
            preview(&example.feature_text),
            rules,
            response,
        ));
        if let Some(note) = &example.note {
            out.push_str(&format!("Reviewer note: {}\n", note.trim()));
        }
    }

    out
}
