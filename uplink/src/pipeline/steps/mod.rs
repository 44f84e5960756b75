//! The pipeline step implementations, in canonical order.

mod client_validation;
mod collect;
mod confirm;
mod coordinate;
mod display;
mod focus;
mod hooks;
mod request;
mod response;
mod state;
mod swap;
mod validate;

pub use client_validation::ClientValidateStep;
pub use collect::CollectStep;
pub use confirm::ConfirmStep;
pub use coordinate::{CoordinateCleanupStep, CoordinateEnterStep};
pub use display::DisplayValidationStep;
pub use focus::RestoreFocusStep;
pub use hooks::{AfterHooksStep, BeforeHooksStep};
pub use request::{BuildRequestStep, ExecuteRequestStep};
pub use response::{ParseResponseStep, RouteResponseStep};
pub use state::{ApplyStateStep, CaptureStateStep, RestoreStateStep};
pub use swap::SwapContentStep;
pub use validate::ValidateConfigStep;
