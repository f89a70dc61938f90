//! Extract a decision from free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::types::Decision;
use crate::error::DecisionError;

/// Reasoning attached when a response holds no JSON at all.
pub const UNPARSEABLE_REASONING: &str = "failed to parse model response";

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid regex"));

/// Locate the JSON object inside a response.
///
/// Tries a fenced code block first, then a bare object, then the outermost
/// braces. Returns `None` when there is nothing that looks like an object.
pub fn extract_json(raw: &str) -> Option<&str> {
    if let Some(captures) = FENCED_JSON.captures(raw) {
        if let Some(body) = captures.get(1) {
            return Some(body.as_str());
        }
    }

    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&raw[start..=end]),
        _ => None,
    }
}

/// Parse a model response into a [`Decision`].
///
/// A response without any JSON object is a PASS carrying
/// [`UNPARSEABLE_REASONING`]. JSON that is present but malformed is an error.
pub fn parse_response(raw: &str) -> Result<Decision, DecisionError> {
    let Some(json) = extract_json(raw) else {
        warn!(len = raw.len(), "No JSON object in model response");
        return Ok(Decision {
            estimated_probability: None,
            estimated_edge: None,
            ..Decision::pass(50, 0, UNPARSEABLE_REASONING)
        });
    };

    debug!(json = %json, "Extracted decision JSON");
    let decision: Decision = serde_json::from_str(json.trim())?;
    Ok(decision)
}
