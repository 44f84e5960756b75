//! Server validation display: clears stale messages and paints the
//! problem payload's field errors.

use crate::context::PipelineContext;
use crate::dom::Element;
use crate::engine::EngineServices;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use async_trait::async_trait;

/// Renders `ctx.validation` into the acting form.
pub struct DisplayValidationStep;

#[async_trait]
impl PipelineStep for DisplayValidationStep {
    fn name(&self) -> &'static str {
        "display-validation"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        let Some(form) = ctx.element().and_then(|el| resolve_form(&el)) else {
            return Ok(StepFlow::Continue);
        };

        let display = services.validation.display();
        // Client-side failures painted their own messages; leave them
        if ctx.error.as_ref().map_or(true, |e| e.code() != "VALIDATION_ERROR") {
            display.clear_all(&form);
        }

        if let Some(ref validation) = ctx.validation {
            for (field, messages) in &validation.errors {
                display.show_error(&form, field, &messages.join(", "));
            }
        }
        Ok(StepFlow::Continue)
    }
}

fn resolve_form(element: &Element) -> Option<Element> {
    if element.is_form_like() {
        Some(element.clone())
    } else {
        element.closest("form")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::dom::Document;
    use crate::engine::Engine;
    use crate::response::ProblemPayload;
    use std::collections::BTreeMap;

    fn form_with_span(document: &Document, field: &str) -> Element {
        let form = Element::new("form");
        let input = Element::new("input");
        input.set_attr("name", field);
        form.append_child(&input);
        let span = Element::new("span");
        span.set_attr("data-valmsg-for", field);
        form.append_child(&span);
        document.root().append_child(&form);
        form
    }

    #[tokio::test]
    async fn test_displays_problem_errors() {
        let document = Document::new();
        let form = form_with_span(&document, "email");
        let engine = Engine::new(document);

        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), vec!["Required".to_string()]);

        let mut ctx = PipelineContext::new(Some(&form), RequestConfig::default(), "submit");
        ctx.validation = Some(ProblemPayload {
            title: "Validation failed".to_string(),
            detail: String::new(),
            errors,
        });

        DisplayValidationStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();

        assert_eq!(
            engine
                .services()
                .validation
                .display()
                .displayed_message(&form, "email")
                .as_deref(),
            Some("Required")
        );
    }

    #[tokio::test]
    async fn test_clears_stale_messages_on_success() {
        let document = Document::new();
        let form = form_with_span(&document, "email");
        let engine = Engine::new(document);
        engine
            .services()
            .validation
            .display()
            .show_error(&form, "email", "stale");

        let mut ctx = PipelineContext::new(Some(&form), RequestConfig::default(), "submit");
        DisplayValidationStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();

        assert!(engine
            .services()
            .validation
            .display()
            .displayed_message(&form, "email")
            .is_none());
    }

    #[tokio::test]
    async fn test_client_validation_messages_left_intact() {
        let document = Document::new();
        let form = form_with_span(&document, "email");
        let engine = Engine::new(document);
        engine
            .services()
            .validation
            .display()
            .show_error(&form, "email", "Required.");

        let mut ctx = PipelineContext::new(Some(&form), RequestConfig::default(), "submit");
        ctx.fail(crate::errors::UplinkError::validation(vec![
            "email".to_string()
        ]));

        DisplayValidationStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();

        assert_eq!(
            engine
                .services()
                .validation
                .display()
                .displayed_message(&form, "email")
                .as_deref(),
            Some("Required.")
        );
    }
}
