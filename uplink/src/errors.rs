//! Error types for the uplink engine.
//!
//! The taxonomy is closed: every failure a pipeline run can end in maps to
//! one of these variants, and each variant carries a stable string code so
//! hook collaborators can branch on `error.code()` without matching on the
//! enum shape.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for uplink operations.
///
/// Errors are cloneable because a run's terminal error lives on the
/// pipeline context (where hooks observe it) *and* is returned to the
/// caller of the public entry points.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UplinkError {
    /// Missing or malformed configuration. Fatal: raised before any side
    /// effect of the run.
    #[error("Configuration error: {message}")]
    Config {
        /// The error message.
        message: String,
    },

    /// Client-side constraint failure. Recoverable: the run continues to
    /// teardown and no network call is made.
    #[error("Validation failed for: {}", fields.join(", "))]
    Validation {
        /// Names of the offending fields, in document order.
        fields: Vec<String>,
    },

    /// The server answered with a structured problem payload.
    #[error("{title}")]
    ServerValidation {
        /// The problem payload's title, or a generic fallback.
        title: String,
    },

    /// A non-2xx response without a problem payload.
    #[error("Request failed with status {status}: {status_text}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The status text, or "request failed" when absent.
        status_text: String,
    },

    /// Transport-level failure (connect, read, protocol).
    #[error("Network error: {message}")]
    Network {
        /// The error message.
        message: String,
    },

    /// The run's network call was cancelled, typically by a newer run
    /// under the abort-previous strategy.
    #[error("Request aborted: {reason}")]
    Aborted {
        /// The cancellation reason.
        reason: String,
    },

    /// Every attempt of the retry policy produced a retryable status.
    #[error("Request failed with status {status} after {attempts} attempts")]
    RetryExhausted {
        /// The status of the final attempt.
        status: u16,
        /// The number of attempts made.
        attempts: u32,
    },

    /// A collaborator (hook, handler) failed in a way the engine cannot
    /// classify further.
    #[error("Internal error: {message}")]
    Internal {
        /// The error message.
        message: String,
    },
}

impl UplinkError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a client validation error for the given field names.
    #[must_use]
    pub fn validation(fields: Vec<String>) -> Self {
        Self::Validation { fields }
    }

    /// Creates a server validation error.
    #[must_use]
    pub fn server_validation(title: impl Into<String>) -> Self {
        Self::ServerValidation {
            title: title.into(),
        }
    }

    /// Creates an HTTP error from a status and optional status text.
    #[must_use]
    pub fn http(status: u16, status_text: Option<&str>) -> Self {
        Self::Http {
            status,
            status_text: status_text
                .filter(|t| !t.is_empty())
                .unwrap_or("request failed")
                .to_string(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an abort error.
    #[must_use]
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Returns the stable code string for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::ServerValidation { .. } => "SERVER_VALIDATION_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Network { .. } => "NETWORK_ERROR",
            Self::Aborted { .. } => "ABORT_ERROR",
            Self::RetryExhausted { .. } => "RETRY_EXHAUSTED",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns true for errors that should never be retried.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// Converts to a dictionary representation for event payloads.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::Validation { fields } => {
                map.insert("fields".to_string(), serde_json::json!(fields));
            }
            Self::Http {
                status,
                status_text,
            } => {
                map.insert("status".to_string(), serde_json::json!(status));
                map.insert("status_text".to_string(), serde_json::json!(status_text));
            }
            Self::RetryExhausted { status, attempts } => {
                map.insert("status".to_string(), serde_json::json!(status));
                map.insert("attempts".to_string(), serde_json::json!(attempts));
            }
            _ => {}
        }

        map
    }
}
