//! Final focus restoration.

use crate::context::PipelineContext;
use crate::dom::Element;
use crate::engine::EngineServices;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use async_trait::async_trait;

/// Restores keyboard focus after a successful run.
///
/// Prefers the configured focus target; otherwise returns focus to the
/// acting element when it is still present, focusable, and not already
/// focused. Skipped entirely when the run ended in error.
pub struct RestoreFocusStep;

#[async_trait]
impl PipelineStep for RestoreFocusStep {
    fn name(&self) -> &'static str {
        "restore-focus"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if ctx.has_error() {
            return Ok(StepFlow::Continue);
        }

        if let Some(ref reference) = ctx.config.focus {
            if let Some(target) = services.document.resolve(reference) {
                if is_focusable(&target) {
                    services.document.focus(&target);
                    return Ok(StepFlow::Continue);
                }
            }
        }

        if let Some(element) = ctx.element() {
            if services.document.contains(&element)
                && is_focusable(&element)
                && services.document.active_element() != Some(element.clone())
            {
                services.document.focus(&element);
            }
        }
        Ok(StepFlow::Continue)
    }
}

fn is_focusable(element: &Element) -> bool {
    if !element.is_visible() || element.is_disabled() {
        return false;
    }
    if let Some(tabindex) = element.attr("tabindex") {
        return tabindex.parse::<i32>().map_or(false, |index| index >= 0);
    }
    element.is_input_like()
        || element.is_button_like()
        || element.tag() == "button"
        || (element.tag() == "a" && element.has_attr("href"))
}
