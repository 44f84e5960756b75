//! The validation engine: orchestrates validators, adapters, eligibility,
//! and error display.

use super::adapters::{adapter_for, AdapterRegistry, ElementAdapter};
use super::attributes::parse_validation_attributes;
use super::display::ErrorDisplay;
use super::result::{CombinedResult, ValidationResult};
use super::validators::{ValidatorFn, ValidatorRegistry};
use crate::collector::FieldValue;
use crate::dom::Element;
use std::sync::Arc;

/// Options for a validation pass.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Whether to render errors into the tree.
    pub show_errors: bool,
    /// Stop at the first failing constraint (default).
    pub stop_on_first: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            show_errors: false,
            stop_on_first: true,
        }
    }
}

impl ValidateOptions {
    /// Options that render errors.
    #[must_use]
    pub fn showing_errors() -> Self {
        Self {
            show_errors: true,
            ..Self::default()
        }
    }
}

/// Decides whether a field participates in validation.
///
/// Disabled controls are always skipped; `data-val-always="true"`
/// bypasses visibility; hidden inputs follow their widget wrapper's
/// visibility via the matching adapter; otherwise the element's own
/// visibility decides.
#[must_use]
pub fn should_validate(element: &Element, adapters: &AdapterRegistry) -> bool {
    if element.attr("data-val").as_deref() != Some("true") {
        return false;
    }
    if element.is_disabled() {
        return false;
    }
    if element.attr("data-val-always").as_deref() == Some("true") {
        return true;
    }

    if element.tag() == "input" && element.attr("type").as_deref() == Some("hidden") {
        // The data backing of a visible widget validates with the widget;
        // a bare hidden input does not validate at all.
        return match adapters.find(element) {
            Some(adapter) => adapter.get_visible_element(element).is_visible(),
            None => false,
        };
    }

    element.is_visible()
}

/// The core validation engine.
pub struct ValidationEngine {
    validators: ValidatorRegistry,
    adapters: AdapterRegistry,
    display: ErrorDisplay,
}

impl ValidationEngine {
    /// Creates an engine with the built-in validators and no widget
    /// adapters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: ValidatorRegistry::with_builtins(),
            adapters: AdapterRegistry::new(),
            display: ErrorDisplay,
        }
    }

    /// Registers a custom validator.
    pub fn register_validator(&self, name: impl Into<String>, validator: ValidatorFn) {
        self.validators.register(name, validator);
    }

    /// Registers a widget adapter.
    pub fn register_adapter(&self, adapter: Arc<dyn ElementAdapter>) {
        self.adapters.register(adapter);
    }

    /// Returns the adapter registry.
    #[must_use]
    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// Returns the error display.
    #[must_use]
    pub fn display(&self) -> &ErrorDisplay {
        &self.display
    }

    /// Validates a single field.
    ///
    /// Runs the field's declared constraints in order, stopping at the
    /// first failure unless configured otherwise, and clears or paints
    /// the field's displayed error when `show_errors` is set.
    #[must_use]
    pub fn validate_field(&self, field: &Element, options: ValidateOptions) -> ValidationResult {
        let parsed = parse_validation_attributes(field);
        if !parsed.enabled {
            return ValidationResult::valid();
        }

        let field_name = field.attr("name").unwrap_or_default();
        let form = field.closest("form");

        let adapter = adapter_for(&self.adapters, field);
        let value = adapter
            .get_value(field)
            .unwrap_or_else(|| FieldValue::Text(String::new()));

        for config in &parsed.validators {
            let Some(validator) = self.validators.get(&config.name) else {
                continue;
            };

            let result = validator(&value, config, field);
            if !result.is_valid() {
                if options.show_errors {
                    if let Some(ref form) = form {
                        self.display.show_error(
                            form,
                            &field_name,
                            result.message().unwrap_or(""),
                        );
                    }
                }
                if options.stop_on_first {
                    return result;
                }
            }
        }

        if options.show_errors {
            if let Some(ref form) = form {
                self.display.clear_error(form, &field_name);
            }
        }
        ValidationResult::valid()
    }

    /// Validates every eligible field in a form.
    #[must_use]
    pub fn validate_form(&self, form: &Element, options: ValidateOptions) -> CombinedResult {
        let results: Vec<ValidationResult> = self
            .eligible_fields(form)
            .iter()
            .map(|field| self.validate_field(field, options))
            .collect();
        ValidationResult::combine(&results)
    }

    /// Returns the form's validatable fields, eligibility applied.
    #[must_use]
    pub fn eligible_fields(&self, form: &Element) -> Vec<Element> {
        form.query_selector_all("[data-val=\"true\"]")
            .into_iter()
            .filter(|field| should_validate(field, &self.adapters))
            .collect()
    }

    /// Clears every displayed error in a form.
    pub fn clear_errors(&self, form: &Element) {
        self.display.clear_all(form);
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("validators", &self.validators)
            .field("adapters", &self.adapters)
            .finish()
    }
}
