//! # Uplink
//!
//! A declarative request-orchestration engine: markup-level attributes on
//! elements of an application-owned UI tree trigger network requests, and
//! the responses are patched back into the tree - no per-interaction glue
//! code.
//!
//! The engine provides:
//!
//! - **An ordered step pipeline**: context creation, confirmation,
//!   coordination, collection, busy-state, hooks, validation, request
//!   execution, response routing, swap, and teardown - fault-tolerant,
//!   with teardown guaranteed on every non-aborted exit path
//! - **Concurrency coordination**: per-element dedup strategies
//!   (`ignore`, `abort-previous`) with cooperative cancellation
//! - **Retry with backoff**: status-driven retryability, exponential
//!   backoff, jitter
//! - **Client-side validation**: declarative per-field constraints, ten
//!   built-in validators, widget adapters, and the touch-based
//!   "angry on blur, forgiving on input" trigger policy
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uplink::prelude::*;
//!
//! let document = Document::new();
//! // ... populate the tree with data-uplink-* attributed elements ...
//! let engine = Engine::new(document);
//!
//! // Feed observed UI events into delegation
//! engine.dispatch(&UiEvent::new("click", button));
//!
//! // Or drive an element programmatically
//! let ctx = engine.trigger(&button, TriggerOptions::new()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod collector;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod dom;
pub mod engine;
pub mod errors;
pub mod events;
pub mod hooks;
pub mod observability;
pub mod pipeline;
pub mod response;
pub mod retry;
pub mod serialize;
pub mod state;
pub mod swap;
pub mod testing;
pub mod transport;
pub mod trigger;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::collector::{Collected, FieldMap, FieldValue};
    pub use crate::config::{
        ConcurrencyStrategy, ConfigPatch, ConfirmSpec, IndicatorSpec, RequestConfig,
    };
    pub use crate::context::PipelineContext;
    pub use crate::coordinator::ConcurrencyCoordinator;
    pub use crate::dom::{Document, Element, WeakElement};
    pub use crate::engine::{DispatchOutcome, Engine, EngineBuilder, TriggerOptions};
    pub use crate::errors::UplinkError;
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::hooks::HookRegistry;
    pub use crate::response::{ProblemPayload, ResponseBody};
    pub use crate::retry::{RetryOverride, RetryPolicy};
    pub use crate::transport::{HttpTransport, Method, Request, Response, Transport};
    pub use crate::trigger::UiEvent;
    pub use crate::validation::{
        ValidationEngine, ValidationResult, ValidatorConfig,
    };
}
