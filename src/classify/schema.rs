use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default confidence when the model omits one.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.5;

/// Whether a feature needs geo-specific compliance logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Yes,
    No,
    #[default]
    Unclear,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yes => "yes",
            Verdict::No => "no",
            Verdict::Unclear => "unclear",
        }
    }

    /// Lenient parse; anything unrecognized is `Unclear`.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Verdict::Yes,
            "no" | "false" => Verdict::No,
            _ => Verdict::Unclear,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A law cited by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_or_section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LawReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let name = non_empty(value.get("name"))?;
        Some(Self {
            name,
            region: non_empty(value.get("region")),
            article_or_section: non_empty(value.get("article_or_section")),
            source: non_empty(value.get("source")),
        })
    }
}

/// Model output after validation and coercion.
///
/// Unknown fields are ignored. Missing or malformed fields fall back to defaults:
/// verdict `unclear`, empty reasoning, confidence `0.5`. Laws without a name are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    pub verdict: Verdict,
    pub reasoning: String,
    pub laws: Vec<LawReference>,
    pub confidence: f64,
    /// Rule tags the model reported under `provenance.rules_hit`.
    pub rules_hit: Vec<String>,
}

impl Default for ModelVerdict {
    fn default() -> Self {
        Self {
            verdict: Verdict::Unclear,
            reasoning: String::new(),
            laws: Vec::new(),
            confidence: DEFAULT_MODEL_CONFIDENCE,
            rules_hit: Vec::new(),
        }
    }
}

impl ModelVerdict {
    pub fn from_value(value: &Value) -> Self {
        let verdict = value
            .get("needs_geo_logic")
            .and_then(Value::as_str)
            .map(Verdict::coerce)
            .unwrap_or_default();

        let reasoning = value
            .get("reasoning")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let laws = value
            .get("laws")
            .and_then(Value::as_array)
            .map(|laws| laws.iter().filter_map(LawReference::from_value).collect())
            .unwrap_or_default();

        let confidence = value
            .get("confidence")
            .and_then(|c| match c {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .unwrap_or(DEFAULT_MODEL_CONFIDENCE);

        let rules_hit = value
            .pointer("/provenance/rules_hit")
            .and_then(Value::as_array)
            .map(|rules| {
                rules
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            verdict,
            reasoning,
            laws,
            confidence,
            rules_hit,
        }
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
