//! The data-collection step.

use crate::collector::collect;
use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use async_trait::async_trait;

/// Resolves the collection source and extracts field data.
///
/// Programmatic callers may preset `ctx.collect`; the step leaves preset
/// data untouched.
pub struct CollectStep;

#[async_trait]
impl PipelineStep for CollectStep {
    fn name(&self) -> &'static str {
        "collect"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if ctx.collect.is_some() {
            return Ok(StepFlow::Continue);
        }

        let element = ctx.element();
        let collected = collect(
            element.as_ref(),
            ctx.config.collect.as_deref(),
            &services.document,
            &services.hooks,
            services.validation.adapters(),
        )?;

        ctx.collect = Some(collected);
        Ok(StepFlow::Continue)
    }
}
