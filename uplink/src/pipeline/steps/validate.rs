//! Configuration validation: the fatal, before-any-side-effect check.

use crate::config::declared_method_and_url;
use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::errors::UplinkError;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use async_trait::async_trait;

/// Fails fast when the run has no way to resolve a URL.
pub struct ValidateConfigStep;

#[async_trait]
impl PipelineStep for ValidateConfigStep {
    fn name(&self) -> &'static str {
        "validate-config"
    }

    async fn execute(&self, ctx: &mut PipelineContext, _services: &EngineServices) -> StepResult {
        if ctx.config.url.is_some() {
            return Ok(StepFlow::Continue);
        }

        let declared = ctx
            .element()
            .as_ref()
            .and_then(declared_method_and_url);
        if declared.is_none() {
            return Err(UplinkError::config("Missing URL in configuration"));
        }

        Ok(StepFlow::Continue)
    }
}
