//! Layered request configuration.
//!
//! A run's configuration is built exactly once by merging three layers -
//! engine defaults, element-declared attributes, and call-site overrides -
//! and is read-only afterwards.

mod attrs;

pub use attrs::{declared_method_and_url, element_patch, ACTION_MARKER};

use crate::retry::RetryOverride;
use crate::transport::Method;
use std::collections::BTreeMap;

/// Strategy for a second trigger while the element has a run in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyStrategy {
    /// Drop the new run.
    #[default]
    Ignore,
    /// Cancel the in-flight run's network call and take over.
    AbortPrevious,
    /// Reserved for future sequencing; currently proceeds without
    /// touching the in-flight entry.
    Queue,
}

impl ConcurrencyStrategy {
    /// Parses a strategy name; unknown names fall back to ignore.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "abort-previous" => Self::AbortPrevious,
            "queue" => Self::Queue,
            _ => Self::Ignore,
        }
    }
}

/// A busy-indicator declaration: `class`, `class@selector`, or
/// `@selector`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndicatorSpec {
    /// Class added to the acting element while busy.
    pub class: Option<String>,
    /// Reference to an indicator element revealed while busy.
    pub element: Option<String>,
}

impl IndicatorSpec {
    /// Parses an indicator declaration.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.split_once('@') {
            Some((class, element)) => Self {
                class: (!class.is_empty()).then(|| class.to_string()),
                element: (!element.is_empty()).then(|| element.to_string()),
            },
            None => Self {
                class: (!value.is_empty()).then(|| value.to_string()),
                element: None,
            },
        }
    }
}

/// How a run asks for confirmation before proceeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmSpec {
    /// A named handler from the confirm registry.
    Handler(String),
    /// A message for the registered prompt handler.
    Message(String),
}

/// The resolved, immutable configuration of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    /// The request URL.
    pub url: Option<String>,
    /// The request method.
    pub method: Option<Method>,
    /// The swap target reference.
    pub target: Option<String>,
    /// The swap strategy name.
    pub swap: Option<String>,
    /// The serializer name.
    pub serialize: Option<String>,
    /// The collection-source spec.
    pub collect: Option<String>,
    /// The busy indicator.
    pub indicator: Option<IndicatorSpec>,
    /// The retry override.
    pub retry: RetryOverride,
    /// The concurrency strategy.
    pub concurrency: ConcurrencyStrategy,
    /// The confirmation spec.
    pub confirm: Option<ConfirmSpec>,
    /// Before-hook names, run in order.
    pub before: Vec<String>,
    /// After-hook names, run in order.
    pub after: Vec<String>,
    /// The focus-restoration target reference.
    pub focus: Option<String>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// The declared trigger spec, if any.
    pub trigger: Option<String>,
    /// Whether client-side validation runs for this element.
    pub validate: bool,
}

/// One configuration layer: every recognized option, optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    /// Override for `url`.
    pub url: Option<String>,
    /// Override for `method`.
    pub method: Option<Method>,
    /// Override for `target`.
    pub target: Option<String>,
    /// Override for `swap`.
    pub swap: Option<String>,
    /// Override for `serialize`.
    pub serialize: Option<String>,
    /// Override for `collect`.
    pub collect: Option<String>,
    /// Override for `indicator`.
    pub indicator: Option<IndicatorSpec>,
    /// Override for `retry`.
    pub retry: Option<RetryOverride>,
    /// Override for `concurrency`.
    pub concurrency: Option<ConcurrencyStrategy>,
    /// Override for `confirm`.
    pub confirm: Option<ConfirmSpec>,
    /// Override for `before`.
    pub before: Option<Vec<String>>,
    /// Override for `after`.
    pub after: Option<Vec<String>>,
    /// Override for `focus`.
    pub focus: Option<String>,
    /// Headers merged over lower layers.
    pub headers: BTreeMap<String, String>,
    /// Override for `trigger`.
    pub trigger: Option<String>,
    /// Override for `validate`.
    pub validate: Option<bool>,
}

impl ConfigPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the swap target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the retry override.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryOverride) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the concurrency strategy.
    #[must_use]
    pub fn with_concurrency(mut self, strategy: ConcurrencyStrategy) -> Self {
        self.concurrency = Some(strategy);
        self
    }

    /// Sets the collection-source spec.
    #[must_use]
    pub fn with_collect(mut self, collect: impl Into<String>) -> Self {
        self.collect = Some(collect.into());
        self
    }

    /// Sets the serializer name.
    #[must_use]
    pub fn with_serialize(mut self, serialize: impl Into<String>) -> Self {
        self.serialize = Some(serialize.into());
        self
    }

    /// Applies the patch onto a configuration.
    pub fn apply_to(&self, config: &mut RequestConfig) {
        if let Some(ref url) = self.url {
            config.url = Some(url.clone());
        }
        if let Some(method) = self.method {
            config.method = Some(method);
        }
        if let Some(ref target) = self.target {
            config.target = Some(target.clone());
        }
        if let Some(ref swap) = self.swap {
            config.swap = Some(swap.clone());
        }
        if let Some(ref serialize) = self.serialize {
            config.serialize = Some(serialize.clone());
        }
        if let Some(ref collect) = self.collect {
            config.collect = Some(collect.clone());
        }
        if let Some(ref indicator) = self.indicator {
            config.indicator = Some(indicator.clone());
        }
        if let Some(ref retry) = self.retry {
            config.retry = retry.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(ref confirm) = self.confirm {
            config.confirm = Some(confirm.clone());
        }
        if let Some(ref before) = self.before {
            config.before = before.clone();
        }
        if let Some(ref after) = self.after {
            config.after = after.clone();
        }
        if let Some(ref focus) = self.focus {
            config.focus = Some(focus.clone());
        }
        for (name, value) in &self.headers {
            config.headers.insert(name.clone(), value.clone());
        }
        if let Some(ref trigger) = self.trigger {
            config.trigger = Some(trigger.clone());
        }
        if let Some(validate) = self.validate {
            config.validate = validate;
        }
    }
}

/// Builds a run's configuration from the three layers.
#[must_use]
pub fn resolve_config(
    defaults: &ConfigPatch,
    element: Option<&crate::dom::Element>,
    overrides: &ConfigPatch,
) -> RequestConfig {
    let mut config = RequestConfig::default();
    defaults.apply_to(&mut config);
    if let Some(element) = element {
        element_patch(element).apply_to(&mut config);
    }
    overrides.apply_to(&mut config);
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn test_indicator_parse() {
        assert_eq!(
            IndicatorSpec::parse("spinner"),
            IndicatorSpec {
                class: Some("spinner".to_string()),
                element: None
            }
        );
        assert_eq!(
            IndicatorSpec::parse("busy@#loading"),
            IndicatorSpec {
                class: Some("busy".to_string()),
                element: Some("#loading".to_string())
            }
        );
        assert_eq!(
            IndicatorSpec::parse("@#loading"),
            IndicatorSpec {
                class: None,
                element: Some("#loading".to_string())
            }
        );
    }

    #[test]
    fn test_concurrency_parse_defaults_to_ignore() {
        assert_eq!(
            ConcurrencyStrategy::parse("abort-previous"),
            ConcurrencyStrategy::AbortPrevious
        );
        assert_eq!(ConcurrencyStrategy::parse("nonsense"), ConcurrencyStrategy::Ignore);
    }

    #[test]
    fn test_layering_order() {
        let defaults = ConfigPatch::new().with_url("/default").with_target("panel");
        let overrides = ConfigPatch::new().with_url("/override");

        let element = Element::new("button");
        element.set_attr("data-uplink", "");
        element.set_attr("data-uplink-post", "/from-element");

        let config = resolve_config(&defaults, Some(&element), &overrides);
        // Overrides beat the element, which beats defaults
        assert_eq!(config.url.as_deref(), Some("/override"));
        assert_eq!(config.method, Some(crate::transport::Method::Post));
        assert_eq!(config.target.as_deref(), Some("panel"));
    }

    #[test]
    fn test_headers_merge_across_layers() {
        let mut defaults = ConfigPatch::new();
        defaults
            .headers
            .insert("x-app".to_string(), "demo".to_string());
        let mut overrides = ConfigPatch::new();
        overrides
            .headers
            .insert("x-request".to_string(), "7".to_string());

        let config = resolve_config(&defaults, None, &overrides);
        assert_eq!(config.headers.len(), 2);
    }
}
