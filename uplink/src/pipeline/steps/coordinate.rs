//! Concurrency coordination entry and cleanup.

use crate::context::PipelineContext;
use crate::coordinator::EnterOutcome;
use crate::engine::EngineServices;
use crate::events::get_event_sink;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use async_trait::async_trait;

/// Registers the run with the coordinator, applying the dedup strategy.
///
/// A dropped duplicate aborts without installing an entry, so the
/// abort-skipped cleanup step has nothing to release.
pub struct CoordinateEnterStep;

#[async_trait]
impl PipelineStep for CoordinateEnterStep {
    fn name(&self) -> &'static str {
        "coordinate-enter"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        let Some(element) = ctx.element() else {
            return Ok(StepFlow::Continue);
        };

        let outcome = services.coordinator.enter(
            element.id(),
            ctx.id,
            ctx.cancellation.clone(),
            ctx.config.concurrency,
        );

        match outcome {
            EnterOutcome::Admitted => Ok(StepFlow::Continue),
            EnterOutcome::Duplicate => {
                get_event_sink().try_emit(
                    "coordinate.duplicate",
                    Some(serde_json::json!({
                        "id": ctx.id,
                        "element": element.id(),
                    })),
                );
                Ok(StepFlow::Abort)
            }
        }
    }
}

/// Releases the run's coordinator entry, id-matched so a late-finishing
/// superseded run never evicts a newer run's entry.
pub struct CoordinateCleanupStep;

#[async_trait]
impl PipelineStep for CoordinateCleanupStep {
    fn name(&self) -> &'static str {
        "coordinate-cleanup"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if let Some(element) = ctx.element() {
            services.coordinator.cleanup(element.id(), ctx.id);
        }
        Ok(StepFlow::Continue)
    }
}
