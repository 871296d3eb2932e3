use serde_json::Value;
use thiserror::Error;

use super::normalize::is_present;
use super::types::BreakdownRequest;

pub const DEFAULT_DEPTH: &str = "1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("request body is not a JSON object")]
    NotAnObject,
    #[error("idea must be a non-empty string")]
    Idea,
}

/// Prompt text for a free-form field: strings verbatim, anything else as JSON.
fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl BreakdownRequest {
    /// Validate a decoded request body.
    ///
    /// Only `idea` is checked. `depth` defaults to 1 when absent or `null` and
    /// is otherwise kept as its JSON text. A falsy `focusArea` is unset.
    pub fn from_json(body: &Value) -> Result<Self, InvalidInput> {
        let obj = body.as_object().ok_or(InvalidInput::NotAnObject)?;

        let idea = match obj.get("idea") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(InvalidInput::Idea),
        };

        let depth = match obj.get("depth") {
            None | Some(Value::Null) => DEFAULT_DEPTH.to_string(),
            Some(v) => v.to_string(),
        };

        let focus_area = obj
            .get("focusArea")
            .filter(|v| is_present(v))
            .map(render_value);

        Ok(Self {
            idea,
            depth,
            focus_area,
        })
    }
}
