//! The pipeline: an ordered, fault-tolerant step sequence over one
//! context.

pub mod runner;
pub mod steps;

#[cfg(test)]
mod integration_tests;

use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::errors::UplinkError;
use async_trait::async_trait;
use std::sync::Arc;

/// How a step leaves the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFlow {
    /// Proceed to the next step.
    Continue,
    /// Latch the abort flag; remaining steps are skipped.
    Abort,
}

/// The result of one step: continue, abort, or fail.
///
/// Failures are captured into the context by the runner, which then
/// continues so teardown steps still execute - the catch-and-continue
/// contract is part of the type, not a convention.
pub type StepResult = Result<StepFlow, UplinkError>;

/// One pipeline step.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// The step's name, for events and tracing.
    fn name(&self) -> &'static str;

    /// Executes the step against the run's context.
    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult;
}

/// The canonical step order.
#[must_use]
pub fn default_steps() -> Vec<Arc<dyn PipelineStep>> {
    vec![
        Arc::new(steps::ValidateConfigStep),
        Arc::new(steps::ConfirmStep),
        Arc::new(steps::CoordinateEnterStep),
        Arc::new(steps::CollectStep),
        Arc::new(steps::CaptureStateStep),
        Arc::new(steps::ApplyStateStep),
        Arc::new(steps::BeforeHooksStep),
        Arc::new(steps::ClientValidateStep),
        Arc::new(steps::BuildRequestStep),
        Arc::new(steps::ExecuteRequestStep),
        Arc::new(steps::ParseResponseStep),
        Arc::new(steps::RouteResponseStep),
        Arc::new(steps::DisplayValidationStep),
        Arc::new(steps::SwapContentStep),
        Arc::new(steps::RestoreStateStep),
        Arc::new(steps::AfterHooksStep),
        Arc::new(steps::RestoreFocusStep),
        Arc::new(steps::CoordinateCleanupStep),
    ]
}
