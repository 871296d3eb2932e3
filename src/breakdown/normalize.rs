use std::sync::LazyLock;

use serde_json::{Map, Value, json};
use thiserror::Error;

use super::extract::{ExtractionMode, extract_object};
use super::types::PRIORITY_KEYS;

pub const REQUIRED_KEYS: [&str; 4] = [
    "overview",
    "priorities",
    "systemArchitecture",
    "developmentSteps",
];

/// Why a model reply could not be turned into a breakdown.
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("malformed model output: no JSON object found")]
    NoJsonObject,
    #[error("malformed model output: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("malformed model output: JSON value is not an object")]
    NotAnObject,
    #[error("invalid response structure: missing {0}")]
    MissingField(&'static str),
    #[error("invalid response structure: priorities is not an object")]
    PrioritiesNotObject,
}

/// JSON truthiness: `null`, `false`, `0` and `""` count as absent.
pub(super) fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The shape of `PriorityTier::default()`.
static EMPTY_TIER: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "frontend": {"components": []},
        "backend": {"services": [], "dataModel": []}
    })
});

fn empty_tier() -> Value {
    EMPTY_TIER.clone()
}

/// Backfill each priority level the model left out or set to a falsy value.
/// Other keys under `priorities` are kept as sent.
fn merge_priorities(mut parsed: Map<String, Value>) -> Map<String, Value> {
    for key in PRIORITY_KEYS {
        if !parsed.get(key).is_some_and(is_present) {
            parsed.insert(key.to_string(), empty_tier());
        }
    }
    parsed
}

/// Check the top-level shape and backfill missing priority tiers.
pub fn normalize(mut obj: Map<String, Value>) -> Result<Value, ParseFailure> {
    for key in REQUIRED_KEYS {
        if !obj.get(key).is_some_and(is_present) {
            return Err(ParseFailure::MissingField(key));
        }
    }
    let priorities = match obj.remove("priorities") {
        Some(Value::Object(map)) => map,
        _ => return Err(ParseFailure::PrioritiesNotObject),
    };
    obj.insert(
        "priorities".to_string(),
        Value::Object(merge_priorities(priorities)),
    );
    Ok(Value::Object(obj))
}

/// Extract, validate and normalize one model reply.
pub fn parse_model_reply(text: &str, mode: ExtractionMode) -> Result<Value, ParseFailure> {
    normalize(extract_object(text, mode)?)
}
