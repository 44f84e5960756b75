//! The pipeline context: one unit of work, owned by one run.

use crate::cancellation::CancellationToken;
use crate::collector::Collected;
use crate::config::RequestConfig;
use crate::dom::{Element, WeakElement};
use crate::errors::UplinkError;
use crate::response::{ProblemPayload, ResponseBody};
use crate::state::StateManager;
use crate::transport::{Request, Response};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next process-unique run id. Ids are monotonic and never
/// reused.
#[must_use]
pub fn next_run_id() -> u64 {
    NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Mutable run-progress counters.
#[derive(Debug, Default)]
pub struct RunState {
    /// Attempts made by the retry executor.
    pub attempts: u32,
    /// One-way abort latch; once true, remaining steps no-op.
    pub aborted: bool,
    /// Set for debounce-tagged runs so busy state skips disabling.
    pub debounced: bool,
    /// When the network call started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the network call settled.
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock duration of the network call in milliseconds.
    pub duration_ms: Option<i64>,
}

/// The single unit of work flowing through the pipeline.
///
/// Created fresh per triggered action, owned exclusively by one run, and
/// discarded (or returned to the caller) when the run completes. No
/// context is shared across concurrent runs.
#[derive(Debug)]
pub struct PipelineContext {
    /// Process-unique run id, used for coordination and telemetry.
    pub id: u64,
    /// The acting element, if any; weak so a detached subtree can drop.
    pub element: Option<WeakElement>,
    /// Immutable-after-creation configuration.
    pub config: RequestConfig,
    /// The event name that caused execution, or "manual".
    pub trigger: String,
    /// Run-progress counters.
    pub state: RunState,
    /// The built request.
    pub request: Option<Request>,
    /// The raw response.
    pub response: Option<Response>,
    /// The parsed response body.
    pub body: Option<ResponseBody>,
    /// The normalized problem payload, when the server sent one.
    pub validation: Option<ProblemPayload>,
    /// The run's terminal error; earlier errors are never overwritten.
    pub error: Option<UplinkError>,
    /// The resolved collection source and extracted data.
    pub collect: Option<Collected>,
    /// The scoped busy-state handle.
    pub state_manager: Option<StateManager>,
    /// Set only by response routing, only when no error is present.
    pub success: bool,
    /// The run's network cancellation handle.
    pub cancellation: Arc<CancellationToken>,
}

impl PipelineContext {
    /// Creates a fresh context.
    #[must_use]
    pub fn new(
        element: Option<&Element>,
        config: RequestConfig,
        trigger: impl Into<String>,
    ) -> Self {
        Self {
            id: next_run_id(),
            element: element.map(Element::downgrade),
            config,
            trigger: trigger.into(),
            state: RunState::default(),
            request: None,
            response: None,
            body: None,
            validation: None,
            error: None,
            collect: None,
            state_manager: None,
            success: false,
            cancellation: Arc::new(CancellationToken::new()),
        }
    }

    /// Returns the acting element if it is still alive.
    #[must_use]
    pub fn element(&self) -> Option<Element> {
        self.element.as_ref().and_then(WeakElement::upgrade)
    }

    /// Records an error unless one is already present.
    pub fn fail(&mut self, error: UplinkError) {
        if self.error.is_none() {
            self.error = Some(error);
        } else {
            tracing::debug!(
                run_id = self.id,
                suppressed = %error,
                "keeping earlier error"
            );
        }
    }

    /// Returns true once a terminal error is recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Returns the default trigger event for an element kind: `submit` for
/// forms, `change` for native controls, `click` otherwise.
#[must_use]
pub fn default_trigger(element: &Element) -> &'static str {
    if element.is_form_like() {
        "submit"
    } else if element.is_input_like() {
        "change"
    } else {
        "click"
    }
}
