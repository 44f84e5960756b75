//! Retry-with-backoff execution for transport operations.
//!
//! Retryability is decided by response status: a status outside the
//! policy's set returns immediately, covering both success and
//! non-retryable failure. Transport errors retry too, except aborts,
//! which are terminal for the run.

use crate::errors::UplinkError;
use crate::transport::Response;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Maximum attempts (including the initial one).
    pub max_attempts: u32,
    /// Status codes that trigger retry.
    pub status_codes: Vec<u16>,
    /// Base delay between retries in milliseconds.
    #[serde(alias = "baseDelay")]
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    #[serde(alias = "maxDelay")]
    pub max_delay_ms: u64,
    /// Jitter fraction applied uniformly as +/- `jitter * delay`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            status_codes: vec![408, 429, 500, 502, 503, 504],
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the retryable status codes.
    #[must_use]
    pub fn with_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.status_codes = codes;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the jitter fraction.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns true if the status triggers a retry.
    #[must_use]
    pub fn is_retryable(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }
}

/// A partial retry policy parsed from a declarative override.
///
/// Unset fields fall back to the engine's default policy, matching the
/// layered-merge rule applied to the rest of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicyPatch {
    /// Override for `max_attempts`.
    pub max_attempts: Option<u32>,
    /// Override for `status_codes`.
    pub status_codes: Option<Vec<u16>>,
    /// Override for `base_delay_ms`.
    #[serde(alias = "baseDelay")]
    pub base_delay_ms: Option<u64>,
    /// Override for `max_delay_ms`.
    #[serde(alias = "maxDelay")]
    pub max_delay_ms: Option<u64>,
    /// Override for `jitter`.
    pub jitter: Option<f64>,
}

impl RetryPolicyPatch {
    /// Applies the patch on top of a base policy.
    #[must_use]
    pub fn apply_to(&self, base: &RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            status_codes: self
                .status_codes
                .clone()
                .unwrap_or_else(|| base.status_codes.clone()),
            base_delay_ms: self.base_delay_ms.unwrap_or(base.base_delay_ms),
            max_delay_ms: self.max_delay_ms.unwrap_or(base.max_delay_ms),
            jitter: self.jitter.unwrap_or(base.jitter),
        }
    }
}

/// Per-run retry configuration: the default policy, no retries at all,
/// or a patched policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetryOverride {
    /// Use the engine's default policy.
    #[default]
    Default,
    /// First attempt is authoritative.
    Disabled,
    /// A declared patch over the default policy.
    Patch(RetryPolicyPatch),
}

impl RetryOverride {
    /// Resolves to a concrete policy, or `None` when retries are disabled.
    #[must_use]
    pub fn resolve(&self, default: &RetryPolicy) -> Option<RetryPolicy> {
        match self {
            Self::Default => Some(default.clone()),
            Self::Disabled => None,
            Self::Patch(patch) => Some(patch.apply_to(default)),
        }
    }
}

/// Calculates the backoff delay for an attempt (1-indexed).
///
/// `min(base * 2^(attempt-1), max)`, jittered uniformly by +/- the
/// policy's jitter fraction.
#[must_use]
pub fn backoff_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let delay = policy
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(exponent))
        .min(policy.max_delay_ms);

    if policy.jitter <= 0.0 || delay == 0 {
        return Duration::from_millis(delay);
    }

    let spread = (delay as f64 * policy.jitter).round() as i64;
    let offset = rand::thread_rng().gen_range(-spread..=spread);
    let jittered = (delay as i64 + offset).max(0) as u64;
    Duration::from_millis(jittered)
}

/// Executes a transport operation under a retry policy.
///
/// The attempt counter is recorded through `attempts` on every try so
/// the run state observes the count regardless of outcome.
pub async fn execute_with_retry<F, Fut>(
    policy: &RetryPolicy,
    attempts: &mut u32,
    mut operation: F,
) -> Result<Response, UplinkError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Response, UplinkError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error: Option<UplinkError> = None;

    for attempt in 1..=max_attempts {
        *attempts = attempt;

        match operation().await {
            Ok(response) => {
                if !policy.is_retryable(response.status) {
                    return Ok(response);
                }
                if attempt == max_attempts {
                    return Err(UplinkError::RetryExhausted {
                        status: response.status,
                        attempts: max_attempts,
                    });
                }
                last_error = Some(UplinkError::http(response.status, Some(&response.status_text)));
            }
            Err(error) => {
                if error.is_terminal() || attempt == max_attempts {
                    return Err(error);
                }
                last_error = Some(error);
            }
        }

        let delay = backoff_delay(attempt, policy);
        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %last_error.as_ref().map(ToString::to_string).unwrap_or_default(),
            "Retrying after failure"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| UplinkError::network("retry attempts exhausted")))
}
