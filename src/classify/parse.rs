use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::outcome::Outcome;

// Greedy: first `{` through last `}`.
static JSON_BLOCK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").ok());

/// Parses a model response into a JSON object.
///
/// Tries the whole text, then the widest `{...}` span, then gives up with `{}`.
/// Only the first attempt is [`Outcome::Ok`].
pub fn parse_model_output(text: &str) -> Outcome<Value> {
    if let Some(object) = parse_object(text.trim()) {
        return Outcome::Ok(object);
    }

    if let Some(block) = JSON_BLOCK.as_ref().and_then(|re| re.find(text))
        && let Some(object) = parse_object(block.as_str())
    {
        return Outcome::degraded(object, "extracted JSON block from surrounding text");
    }

    warn!(chars = text.len(), "Model output is not a JSON object, using empty result");
    Outcome::degraded(Value::Object(Map::new()), "model output contained no JSON object")
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}
