//! Immutable validation results.

/// The outcome of running one validator over one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    is_valid: bool,
    message: Option<String>,
}

impl ValidationResult {
    /// Creates a valid result.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    /// Creates an invalid result with a message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }

    /// Returns true when the value passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Returns the failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Combines results into a single verdict plus all failure messages.
    #[must_use]
    pub fn combine(results: &[Self]) -> CombinedResult {
        CombinedResult {
            is_valid: results.iter().all(Self::is_valid),
            messages: results
                .iter()
                .filter(|r| !r.is_valid)
                .filter_map(|r| r.message.clone())
                .collect(),
        }
    }
}

/// The reduction of several results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedResult {
    /// True when every result was valid.
    pub is_valid: bool,
    /// Failure messages, in order.
    pub messages: Vec<String>,
}
