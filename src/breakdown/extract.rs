//! Locating the JSON object inside a model reply.
//!
//! Models often wrap the object in prose or code fences. Two strategies are
//! offered: a string-aware brace-balancing scan (default) and the legacy
//! greedy "first `{` to last `}`" match.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::normalize::ParseFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// First balanced `{...}` span that decodes to a JSON object.
    #[default]
    Balanced,
    /// First `{` through last `}` in the reply.
    Greedy,
}

fn greedy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

pub fn greedy_span(text: &str) -> Option<&str> {
    greedy_re().find(text).map(|m| m.as_str())
}

/// Outermost balanced `{...}` spans, in order, found in a single pass.
///
/// String state is only tracked inside an open brace, so quotes in the
/// surrounding prose do not affect the scan. A span nested in another
/// balanced span is not reported; an enclosing brace that never closes does
/// not hide the spans inside it.
pub fn balanced_spans(text: &str) -> Vec<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut closed: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    closed.push((start, i + 1));
                }
            }
            _ => {}
        }
    }

    closed.sort_unstable_by_key(|&(start, _)| start);
    let mut spans = Vec::new();
    let mut covered = 0;
    for (start, end) in closed {
        if start >= covered {
            spans.push(&text[start..end]);
            covered = end;
        }
    }
    spans
}

fn decode_object(span: &str) -> Result<Map<String, Value>, ParseFailure> {
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ParseFailure::NotAnObject),
        Err(e) => Err(ParseFailure::InvalidJson(e)),
    }
}

/// Pull the JSON object out of `text` using `mode`.
///
/// In balanced mode a span that fails to decode does not end the search; the
/// first decoding error is reported only if no later span decodes.
pub fn extract_object(text: &str, mode: ExtractionMode) -> Result<Map<String, Value>, ParseFailure> {
    match mode {
        ExtractionMode::Greedy => {
            let span = greedy_span(text).ok_or(ParseFailure::NoJsonObject)?;
            decode_object(span)
        }
        ExtractionMode::Balanced => {
            let mut first_err = None;
            for span in balanced_spans(text) {
                match decode_object(span) {
                    Ok(map) => return Ok(map),
                    Err(e) => {
                        first_err.get_or_insert(e);
                    }
                }
            }
            Err(first_err.unwrap_or(ParseFailure::NoJsonObject))
        }
    }
}
