//! The validator registry and the ten built-in validators.
//!
//! Validators are pure functions `(value, config, element) -> result`.
//! Empty values pass every validator except `required`: mandatory
//! semantics belong to `required` alone.

use super::attributes::ValidatorConfig;
use super::result::ValidationResult;
use crate::collector::FieldValue;
use crate::dom::Element;
use crate::validation::adapters::{ElementAdapter, NativeAdapter};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A validation function.
pub type ValidatorFn =
    Arc<dyn Fn(&FieldValue, &ValidatorConfig, &Element) -> ValidationResult + Send + Sync>;

/// Registry of named validators.
pub struct ValidatorRegistry {
    validators: RwLock<HashMap<String, ValidatorFn>>,
}

impl ValidatorRegistry {
    /// Creates a registry pre-loaded with the built-ins.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self {
            validators: RwLock::new(HashMap::new()),
        };
        registry.register("required", Arc::new(required));
        registry.register("minlength", Arc::new(minlength));
        registry.register("maxlength", Arc::new(maxlength));
        registry.register("length", Arc::new(length));
        registry.register("range", Arc::new(range));
        registry.register("regex", Arc::new(regex_validator));
        registry.register("email", Arc::new(email));
        registry.register("number", Arc::new(number));
        registry.register("equalto", Arc::new(equalto));
        registry.register("url", Arc::new(url));
        registry
    }

    /// Registers or replaces a validator.
    pub fn register(&self, name: impl Into<String>, validator: ValidatorFn) {
        self.validators.write().insert(name.into(), validator);
    }

    /// Returns the validator for a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ValidatorFn> {
        self.validators.read().get(name).cloned()
    }

    /// Lists registered validator names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.validators.read().keys().cloned().collect()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn message_or(config: &ValidatorConfig, fallback: &str) -> String {
    if config.message.is_empty() {
        fallback.to_string()
    } else {
        config.message.clone()
    }
}

fn param_usize(config: &ValidatorConfig, name: &str) -> Option<usize> {
    config.params.get(name).and_then(|v| v.parse().ok())
}

fn param_f64(config: &ValidatorConfig, name: &str) -> Option<f64> {
    config.params.get(name).and_then(|v| v.parse().ok())
}

fn text_len(value: &FieldValue) -> Option<usize> {
    match value {
        FieldValue::Text(t) => Some(t.chars().count()),
        _ => None,
    }
}

/// `required`: fails on absent, whitespace-only, or empty-list values.
fn required(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    let message = message_or(config, "This field is required.");
    let missing = match value {
        FieldValue::Text(t) => t.trim().is_empty(),
        FieldValue::List(l) => l.is_empty(),
        FieldValue::Flag(_) | FieldValue::Binary { .. } => false,
    };
    if missing {
        ValidationResult::invalid(message)
    } else {
        ValidationResult::valid()
    }
}

/// `minlength`: minimum character count.
fn minlength(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let Some(min) = param_usize(config, "min") else {
        return ValidationResult::valid();
    };
    match text_len(value) {
        Some(len) if len < min => ValidationResult::invalid(message_or(
            config,
            &format!("Minimum {min} characters required."),
        )),
        _ => ValidationResult::valid(),
    }
}

/// `maxlength`: maximum character count.
fn maxlength(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let Some(max) = param_usize(config, "max") else {
        return ValidationResult::valid();
    };
    match text_len(value) {
        Some(len) if len > max => ValidationResult::invalid(message_or(
            config,
            &format!("Maximum {max} characters allowed."),
        )),
        _ => ValidationResult::valid(),
    }
}

/// `length`: combined character-count bounds.
fn length(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let min = param_usize(config, "min").unwrap_or(0);
    let max = param_usize(config, "max").unwrap_or(usize::MAX);
    match text_len(value) {
        Some(len) if len < min || len > max => ValidationResult::invalid(message_or(
            config,
            &format!("Length must be between {min} and {max}."),
        )),
        _ => ValidationResult::valid(),
    }
}

/// `range`: numeric bounds.
fn range(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let min = param_f64(config, "min").unwrap_or(f64::NEG_INFINITY);
    let max = param_f64(config, "max").unwrap_or(f64::INFINITY);
    let message = message_or(config, &format!("Value must be between {min} and {max}."));

    match value.as_text().parse::<f64>() {
        Ok(number) if number >= min && number <= max => ValidationResult::valid(),
        _ => ValidationResult::invalid(message),
    }
}

/// `regex`: pattern match; an unparsable pattern fails validation.
fn regex_validator(
    value: &FieldValue,
    config: &ValidatorConfig,
    _element: &Element,
) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let Some(pattern) = config.params.get("pattern") else {
        return ValidationResult::valid();
    };
    let message = message_or(config, "Invalid format.");

    match regex::Regex::new(pattern) {
        Ok(re) if re.is_match(&value.as_text()) => ValidationResult::valid(),
        _ => ValidationResult::invalid(message),
    }
}

/// `email`: the permissive HTML-style email shape.
fn email(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let message = message_or(config, "Invalid email address.");
    let text = value.as_text();

    let mut parts = text.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None)
            if !local.is_empty()
                && !local.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains(char::is_whitespace)
    );

    if valid {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(message)
    }
}

/// `number`: integers and decimals, negative allowed.
fn number(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let message = message_or(config, "Must be a valid number.");
    let text = value.as_text();
    let digits = text.strip_prefix('-').unwrap_or(&text);

    let valid = !digits.is_empty()
        && digits.split('.').count() <= 2
        && digits.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())
        });

    if valid {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(message)
    }
}

/// `equalto`: cross-field equality against `params["other"]` within the
/// same form.
fn equalto(value: &FieldValue, config: &ValidatorConfig, element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let Some(other_name) = config.params.get("other") else {
        return ValidationResult::valid();
    };
    // Model-binding prefixes reference the sibling property
    let other_name = other_name.strip_prefix("*.").unwrap_or(other_name);
    let message = message_or(config, "Values must match.");

    let Some(form) = element.closest("form") else {
        return ValidationResult::valid();
    };
    let Some(other) = form.query_selector(&format!("[name=\"{other_name}\"]")) else {
        return ValidationResult::valid();
    };

    let other_value = NativeAdapter
        .get_value(&other)
        .map(|v| v.as_text())
        .unwrap_or_default();

    if value.as_text() == other_value {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(message)
    }
}

/// `url`: `scheme://host` shape with a non-empty host.
fn url(value: &FieldValue, config: &ValidatorConfig, _element: &Element) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::valid();
    }
    let message = message_or(config, "Invalid URL.");
    let text = value.as_text();

    let valid = text.split_once("://").map_or(false, |(scheme, rest)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
            && !rest.is_empty()
            && !rest.starts_with('/')
            && !rest.contains(char::is_whitespace)
    });

    if valid {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(message)
    }
}
