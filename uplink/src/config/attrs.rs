//! The declarative attribute vocabulary read from acting elements.

use super::{ConcurrencyStrategy, ConfigPatch, ConfirmSpec, IndicatorSpec};
use crate::dom::Element;
use crate::retry::{RetryOverride, RetryPolicyPatch};
use crate::transport::Method;
use tracing::warn;

/// The marker attribute that makes an element actionable.
pub const ACTION_MARKER: &str = "data-uplink";

const ATTR_PREFIX: &str = "data-uplink-";

fn option_attr(element: &Element, name: &str) -> Option<String> {
    element
        .attr(&format!("{ATTR_PREFIX}{name}"))
        .filter(|v| !v.is_empty())
}

/// Resolves the method and URL declared on an element.
///
/// Forms use their native `action`/`method`; other elements declare a
/// method-specific URL attribute (`data-uplink-get="/search"`).
#[must_use]
pub fn declared_method_and_url(element: &Element) -> Option<(Method, String)> {
    if element.is_form_like() {
        let action = element.attr("action")?;
        let method = element
            .attr("method")
            .and_then(|m| Method::parse(&m))
            .unwrap_or(Method::Get);
        return Some((method, action));
    }

    for method in Method::ALL {
        if let Some(url) = option_attr(element, method.attr_name()) {
            return Some((method, url));
        }
    }
    None
}

/// Builds the element-declared configuration layer.
#[must_use]
pub fn element_patch(element: &Element) -> ConfigPatch {
    let mut patch = ConfigPatch::new();

    if let Some((method, url)) = declared_method_and_url(element) {
        patch.method = Some(method);
        patch.url = Some(url);
    }

    patch.target = option_attr(element, "target");
    patch.swap = option_attr(element, "swap");
    patch.serialize = option_attr(element, "serialize");
    patch.collect = option_attr(element, "collect");
    patch.focus = option_attr(element, "focus");
    patch.trigger = option_attr(element, "trigger");

    if let Some(indicator) = option_attr(element, "indicator") {
        patch.indicator = Some(IndicatorSpec::parse(&indicator));
    }
    if let Some(retry) = option_attr(element, "retry") {
        patch.retry = Some(parse_retry_attr(&retry));
    }
    if let Some(concurrency) = option_attr(element, "concurrency") {
        patch.concurrency = Some(ConcurrencyStrategy::parse(&concurrency));
    }

    if let Some(name) = option_attr(element, "confirm") {
        patch.confirm = Some(ConfirmSpec::Handler(name));
    } else if let Some(message) = option_attr(element, "confirm-message") {
        patch.confirm = Some(ConfirmSpec::Message(message));
    }

    if let Some(before) = option_attr(element, "before") {
        patch.before = Some(split_names(&before));
    }
    if let Some(after) = option_attr(element, "after") {
        patch.after = Some(split_names(&after));
    }

    if let Some(validate) = option_attr(element, "validate") {
        patch.validate = Some(validate == "true");
    }

    patch
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses the retry attribute: `false` disables, `true` keeps the default
/// policy, and a JSON object patches it.
fn parse_retry_attr(value: &str) -> RetryOverride {
    match value {
        "false" => RetryOverride::Disabled,
        "true" => RetryOverride::Default,
        other => match serde_json::from_str::<RetryPolicyPatch>(other) {
            Ok(patch) => RetryOverride::Patch(patch),
            Err(error) => {
                warn!(attr = %other, %error, "unparsable retry attribute; using default policy");
                RetryOverride::Default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_uses_native_action_and_method() {
        let form = Element::new("form");
        form.set_attr("action", "/residents");
        form.set_attr("method", "post");

        assert_eq!(
            declared_method_and_url(&form),
            Some((Method::Post, "/residents".to_string()))
        );
    }

    #[test]
    fn test_method_attribute_resolution() {
        let button = Element::new("button");
        button.set_attr("data-uplink-delete", "/residents/3");

        assert_eq!(
            declared_method_and_url(&button),
            Some((Method::Delete, "/residents/3".to_string()))
        );
    }

    #[test]
    fn test_element_patch_reads_vocabulary() {
        let el = Element::new("button");
        el.set_attr("data-uplink", "");
        el.set_attr("data-uplink-post", "/save");
        el.set_attr("data-uplink-target", "#panel");
        el.set_attr("data-uplink-swap", "outer");
        el.set_attr("data-uplink-indicator", "busy@#spinner");
        el.set_attr("data-uplink-concurrency", "abort-previous");
        el.set_attr("data-uplink-before", "log, gate");
        el.set_attr("data-uplink-confirm", "ask-first");

        let patch = element_patch(&el);
        assert_eq!(patch.url.as_deref(), Some("/save"));
        assert_eq!(patch.method, Some(Method::Post));
        assert_eq!(patch.target.as_deref(), Some("#panel"));
        assert_eq!(patch.swap.as_deref(), Some("outer"));
        assert_eq!(
            patch.indicator,
            Some(IndicatorSpec {
                class: Some("busy".to_string()),
                element: Some("#spinner".to_string())
            })
        );
        assert_eq!(patch.concurrency, Some(ConcurrencyStrategy::AbortPrevious));
        assert_eq!(
            patch.before,
            Some(vec!["log".to_string(), "gate".to_string()])
        );
        assert_eq!(
            patch.confirm,
            Some(ConfirmSpec::Handler("ask-first".to_string()))
        );
    }

    #[test]
    fn test_retry_attribute_forms() {
        let el = Element::new("button");
        el.set_attr("data-uplink-retry", "false");
        assert_eq!(element_patch(&el).retry, Some(RetryOverride::Disabled));

        el.set_attr("data-uplink-retry", "true");
        assert_eq!(element_patch(&el).retry, Some(RetryOverride::Default));

        el.set_attr("data-uplink-retry", r#"{"maxAttempts": 2}"#);
        let patch = element_patch(&el).retry.unwrap();
        match patch {
            RetryOverride::Patch(p) => assert_eq!(p.max_attempts, Some(2)),
            other => panic!("expected patch, got {other:?}"),
        }

        // Garbage falls back to the default policy rather than failing
        el.set_attr("data-uplink-retry", "not json");
        assert_eq!(element_patch(&el).retry, Some(RetryOverride::Default));
    }

    #[test]
    fn test_confirm_message_fallback() {
        let el = Element::new("button");
        el.set_attr("data-uplink-confirm-message", "Delete this resident?");
        assert_eq!(
            element_patch(&el).confirm,
            Some(ConfirmSpec::Message("Delete this resident?".to_string()))
        );
    }
}
