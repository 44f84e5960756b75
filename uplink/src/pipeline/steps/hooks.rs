//! Before/after hook invocation.

use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::errors::UplinkError;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use async_trait::async_trait;
use tracing::warn;

/// Runs the declared before-hooks in order; a hook returning `false`
/// aborts the run.
///
/// By this point the run holds a coordinator entry and has applied busy
/// state, so the aborting path releases both before latching - aborted
/// runs must leave no side effects behind.
pub struct BeforeHooksStep;

#[async_trait]
impl PipelineStep for BeforeHooksStep {
    fn name(&self) -> &'static str {
        "before-hooks"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        for name in ctx.config.before.clone() {
            let Some(hook) = services.hooks.hook(&name) else {
                warn!(hook = %name, "before-hook not registered; skipping");
                continue;
            };

            match hook(ctx).await {
                Ok(true) => {}
                Ok(false) => {
                    abort_teardown(ctx, services);
                    return Ok(StepFlow::Abort);
                }
                Err(error) => {
                    return Err(UplinkError::Internal {
                        message: format!("before-hook \"{name}\" failed: {error}"),
                    });
                }
            }
        }
        Ok(StepFlow::Continue)
    }
}

fn abort_teardown(ctx: &mut PipelineContext, services: &EngineServices) {
    if let Some(manager) = ctx.state_manager.as_mut() {
        manager.restore();
    }
    if let Some(element) = ctx.element() {
        services.coordinator.cleanup(element.id(), ctx.id);
    }
}

/// Runs the declared after-hooks in order, error or not; after-hooks are
/// the surface where collaborators observe the terminal context.
pub struct AfterHooksStep;

#[async_trait]
impl PipelineStep for AfterHooksStep {
    fn name(&self) -> &'static str {
        "after-hooks"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        for name in ctx.config.after.clone() {
            let Some(hook) = services.hooks.hook(&name) else {
                warn!(hook = %name, "after-hook not registered; skipping");
                continue;
            };

            if let Err(error) = hook(ctx).await {
                return Err(UplinkError::Internal {
                    message: format!("after-hook \"{name}\" failed: {error}"),
                });
            }
        }
        Ok(StepFlow::Continue)
    }
}
