//! Error-display rendering: message spans and field class toggling.
//!
//! Message targets follow the `data-valmsg-for` convention; fields get
//! `aria-invalid` plus `input-validation-error`/`-valid` classes, with a
//! case-insensitive fallback for field-name matching.

use crate::dom::Element;

const MSG_ATTR: &str = "data-valmsg-for";
const SPAN_ERROR_CLASS: &str = "field-validation-error";
const SPAN_VALID_CLASS: &str = "field-validation-valid";
const INPUT_ERROR_CLASS: &str = "input-validation-error";
const INPUT_VALID_CLASS: &str = "input-validation-valid";

/// Finds a field by name within a container, case-insensitively as a
/// fallback.
#[must_use]
pub fn find_field_by_name(container: &Element, field_name: &str) -> Option<Element> {
    if field_name.is_empty() {
        return None;
    }
    if let Some(exact) = container.query_selector(&format!("[name=\"{field_name}\"]")) {
        return Some(exact);
    }
    let lower = field_name.to_lowercase();
    container
        .query_selector_all("[name]")
        .into_iter()
        .find(|field| {
            field
                .attr("name")
                .map_or(false, |name| name.to_lowercase() == lower)
        })
}

/// Finds a validation message span for a field name.
#[must_use]
pub fn find_message_span(container: &Element, field_name: &str) -> Option<Element> {
    if field_name.is_empty() {
        return None;
    }
    if let Some(exact) = container.query_selector(&format!("[{MSG_ATTR}=\"{field_name}\"]")) {
        return Some(exact);
    }
    let lower = field_name.to_lowercase();
    container
        .query_selector_all(&format!("[{MSG_ATTR}]"))
        .into_iter()
        .find(|span| {
            span.attr(MSG_ATTR)
                .map_or(false, |name| name.to_lowercase() == lower)
        })
}

/// Renders and clears field-level validation messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorDisplay;

impl ErrorDisplay {
    /// Shows a message for a field.
    pub fn show_error(&self, form: &Element, field_name: &str, message: &str) {
        if let Some(span) = find_message_span(form, field_name) {
            span.set_text(message);
            span.remove_class(SPAN_VALID_CLASS);
            span.add_class(SPAN_ERROR_CLASS);
        }
        if let Some(field) = find_field_by_name(form, field_name) {
            field.set_attr("aria-invalid", "true");
            field.remove_class(INPUT_VALID_CLASS);
            field.add_class(INPUT_ERROR_CLASS);
        }
    }

    /// Clears a field's message and error styling.
    pub fn clear_error(&self, form: &Element, field_name: &str) {
        if let Some(span) = find_message_span(form, field_name) {
            span.set_text("");
            span.remove_class(SPAN_ERROR_CLASS);
            span.add_class(SPAN_VALID_CLASS);
        }
        if let Some(field) = find_field_by_name(form, field_name) {
            field.remove_attr("aria-invalid");
            field.remove_class(INPUT_ERROR_CLASS);
            field.add_class(INPUT_VALID_CLASS);
        }
    }

    /// Clears every message and error marker in the form.
    pub fn clear_all(&self, form: &Element) {
        for span in form.query_selector_all(&format!("[{MSG_ATTR}]")) {
            span.set_text("");
            span.remove_class(SPAN_ERROR_CLASS);
            span.add_class(SPAN_VALID_CLASS);
        }
        for field in form.query_selector_all("[aria-invalid=\"true\"]") {
            field.remove_attr("aria-invalid");
        }
        for field in form.query_selector_all(&format!(".{INPUT_ERROR_CLASS}")) {
            field.remove_class(INPUT_ERROR_CLASS);
            field.add_class(INPUT_VALID_CLASS);
        }
    }

    /// Returns the currently displayed message for a field, if any.
    #[must_use]
    pub fn displayed_message(&self, form: &Element, field_name: &str) -> Option<String> {
        find_message_span(form, field_name)
            .map(|span| span.text())
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_field(name: &str) -> (Element, Element, Element) {
        let form = Element::new("form");
        let input = Element::new("input");
        input.set_attr("name", name);
        form.append_child(&input);
        let span = Element::new("span");
        span.set_attr(MSG_ATTR, name);
        form.append_child(&span);
        (form, input, span)
    }

    #[test]
    fn test_show_and_clear_error() {
        let (form, input, span) = form_with_field("email");
        let display = ErrorDisplay;

        display.show_error(&form, "email", "Required");
        assert_eq!(span.text(), "Required");
        assert!(span.has_class(SPAN_ERROR_CLASS));
        assert_eq!(input.attr("aria-invalid").as_deref(), Some("true"));
        assert!(input.has_class(INPUT_ERROR_CLASS));

        display.clear_error(&form, "email");
        assert_eq!(span.text(), "");
        assert!(span.has_class(SPAN_VALID_CLASS));
        assert!(!input.has_attr("aria-invalid"));
        assert!(input.has_class(INPUT_VALID_CLASS));
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let (form, _input, span) = form_with_field("Employee.Email");
        ErrorDisplay.show_error(&form, "employee.email", "Required");
        assert_eq!(span.text(), "Required");
    }

    #[test]
    fn test_clear_all() {
        let (form, input, span) = form_with_field("email");
        let display = ErrorDisplay;
        display.show_error(&form, "email", "Required");

        display.clear_all(&form);
        assert_eq!(span.text(), "");
        assert!(!input.has_attr("aria-invalid"));
        assert!(!input.has_class(INPUT_ERROR_CLASS));
    }

    #[test]
    fn test_displayed_message() {
        let (form, _input, _span) = form_with_field("email");
        let display = ErrorDisplay;
        assert!(display.displayed_message(&form, "email").is_none());

        display.show_error(&form, "email", "Required");
        assert_eq!(
            display.displayed_message(&form, "email").as_deref(),
            Some("Required")
        );
    }
}
