//! Response body parsing and the structured-problem wire contract.

use crate::transport::Response;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed response body, selected by content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded JSON payload.
    Json(serde_json::Value),
    /// Textual payload.
    Text(String),
    /// Anything else, kept opaque.
    Binary(Vec<u8>),
}

impl ResponseBody {
    /// Renders the body for content swapping; opaque bodies have none.
    #[must_use]
    pub fn as_swap_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Json(value) => Some(value.to_string()),
            Self::Binary(_) => None,
        }
    }
}

/// The normalized structured-error payload.
///
/// Servers answer validation failures with
/// `{title?, detail?, errors?: map<field, string|seq<string>>}`; error
/// values are coerced to sequences on ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemPayload {
    /// The problem title.
    pub title: String,
    /// The problem detail.
    pub detail: String,
    /// Per-field error messages.
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Returns true if a JSON value has the problem shape.
#[must_use]
pub fn is_problem(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .map_or(false, |obj| {
            obj.contains_key("title") || obj.contains_key("detail") || obj.contains_key("errors")
        })
}

/// Normalizes a problem-shaped JSON value.
#[must_use]
pub fn parse_problem(value: &serde_json::Value) -> Option<ProblemPayload> {
    if !is_problem(value) {
        return None;
    }

    let mut errors = BTreeMap::new();
    if let Some(map) = value.get("errors").and_then(serde_json::Value::as_object) {
        for (field, messages) in map {
            let coerced = match messages {
                serde_json::Value::Array(items) => items.iter().map(json_to_text).collect(),
                serde_json::Value::Null => continue,
                single => vec![json_to_text(single)],
            };
            errors.insert(field.clone(), coerced);
        }
    }

    Some(ProblemPayload {
        title: value
            .get("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Validation error")
            .to_string(),
        detail: value
            .get("detail")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
            .to_string(),
        errors,
    })
}

fn json_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses a response body by content type; returns the body and, for
/// problem-shaped JSON, the normalized payload.
#[must_use]
pub fn parse_body(response: &Response) -> (ResponseBody, Option<ProblemPayload>) {
    let content_type = response.content_type().to_ascii_lowercase();

    if content_type.contains("json") {
        match serde_json::from_slice::<serde_json::Value>(&response.body) {
            Ok(value) => {
                let problem = parse_problem(&value);
                (ResponseBody::Json(value), problem)
            }
            Err(_) => (ResponseBody::Text(response.text()), None),
        }
    } else if content_type.starts_with("text/") {
        (ResponseBody::Text(response.text()), None)
    } else {
        (ResponseBody::Binary(response.body.clone()), None)
    }
}
