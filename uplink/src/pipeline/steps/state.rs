//! Busy-state capture, apply, and restore steps.
//!
//! Capture and apply bracket the run's visible side effects; restore runs
//! on every non-aborted exit path, error or not.

use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use crate::state::StateManager;
use async_trait::async_trait;

/// Captures the acting element's pre-run state.
pub struct CaptureStateStep;

#[async_trait]
impl PipelineStep for CaptureStateStep {
    fn name(&self) -> &'static str {
        "capture-state"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if let Some(element) = ctx.element() {
            ctx.state_manager = Some(StateManager::new(
                element,
                services.document.clone(),
                ctx.config.indicator.clone(),
                ctx.state.debounced,
            ));
        }
        Ok(StepFlow::Continue)
    }
}

/// Applies the busy state.
pub struct ApplyStateStep;

#[async_trait]
impl PipelineStep for ApplyStateStep {
    fn name(&self) -> &'static str {
        "apply-state"
    }

    async fn execute(&self, ctx: &mut PipelineContext, _services: &EngineServices) -> StepResult {
        if let Some(manager) = ctx.state_manager.as_mut() {
            manager.apply();
        }
        Ok(StepFlow::Continue)
    }
}

/// Restores the captured state.
pub struct RestoreStateStep;

#[async_trait]
impl PipelineStep for RestoreStateStep {
    fn name(&self) -> &'static str {
        "restore-state"
    }

    async fn execute(&self, ctx: &mut PipelineContext, _services: &EngineServices) -> StepResult {
        if let Some(manager) = ctx.state_manager.as_mut() {
            manager.restore();
        }
        Ok(StepFlow::Continue)
    }
}
