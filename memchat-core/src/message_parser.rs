//! Model output parsing utilities
//!
//! Completions are untrusted text. These helpers locate the JSON payload a
//! prompt asked for and decode it, returning `None` instead of an error so
//! callers can fall back to their empty result.

use serde_json::Value;
use tracing::{debug, warn};

/// Returns the JSON candidate inside a completion
///
/// Models often wrap the requested JSON in a markdown code block. When the
/// trimmed text is itself fenced, the fence is removed; otherwise the trimmed
/// text is returned unchanged.
pub fn extract_json_payload(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string ("json", "JSON", ...) up to the end of the line
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open,
    };

    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Decodes the JSON payload of a completion, logging failures under `label`
pub fn parse_json_payload(content: &str, label: &str) -> Option<Value> {
    let payload = extract_json_payload(content);
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            debug!("{}: decoded JSON payload", label);
            Some(value)
        },
        Err(e) => {
            warn!("{}: model output is not valid JSON: {}", label, e);
            None
        },
    }
}

/// Reads an integer ID from model output
///
/// Whole-number floats such as `2.0` count as integers; fractional or
/// out-of-range numbers do not.
pub fn integer_id(value: &Value) -> Option<i64> {
    if let Some(id) = value.as_i64() {
        return Some(id);
    }
    let float = value.as_f64()?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.fract() == 0.0 && in_range).then_some(float as i64)
}
