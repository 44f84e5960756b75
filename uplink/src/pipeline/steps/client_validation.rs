//! The client-side validation step.

use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::errors::UplinkError;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use crate::validation::ValidateOptions;
use async_trait::async_trait;

/// Validates the acting form's eligible fields before any request is
/// built.
///
/// Failures set a validation error rather than aborting, so teardown
/// steps still execute; no network call is made because later steps skip
/// their primary effect once an error is present.
pub struct ClientValidateStep;

#[async_trait]
impl PipelineStep for ClientValidateStep {
    fn name(&self) -> &'static str {
        "client-validate"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if ctx.has_error() {
            return Ok(StepFlow::Continue);
        }
        let Some(element) = ctx.element() else {
            return Ok(StepFlow::Continue);
        };
        if !element.is_form_like() || !ctx.config.validate {
            return Ok(StepFlow::Continue);
        }

        let mut invalid_fields = Vec::new();
        for field in services.validation.eligible_fields(&element) {
            let result = services
                .validation
                .validate_field(&field, ValidateOptions::showing_errors());
            services
                .field_triggers
                .record_result(field.id(), result.is_valid());
            if !result.is_valid() {
                invalid_fields.push(field.attr("name").unwrap_or_else(|| "field".to_string()));
            }
        }

        if invalid_fields.is_empty() {
            Ok(StepFlow::Continue)
        } else {
            Err(UplinkError::validation(invalid_fields))
        }
    }
}
