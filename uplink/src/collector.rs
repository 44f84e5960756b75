//! Data collection: resolving the collection source and extracting a
//! field-name to value mapping from it.
//!
//! Extraction consults, in priority order: a custom value-selector
//! attribute, a named extractor from the hook registry, a matching widget
//! adapter, and finally native control semantics.

use crate::dom::{normalize_selector, Document, Element};
use crate::errors::UplinkError;
use crate::hooks::HookRegistry;
use crate::validation::adapters::AdapterRegistry;
use tracing::warn;

/// A collected field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A single textual value.
    Text(String),
    /// Repeated values (multi-select, same-named fields).
    List(Vec<String>),
    /// A boolean control state (checkbox adapters).
    Flag(bool),
    /// Binary-capable field content, passed through untouched.
    Binary {
        /// The original file name.
        file_name: String,
        /// The payload content type.
        content_type: String,
        /// The raw bytes.
        bytes: Vec<u8>,
    },
}

impl FieldValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns true for values every validator except `required` passes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(t) => t.is_empty(),
            Self::List(l) => l.is_empty(),
            Self::Flag(_) | Self::Binary { .. } => false,
        }
    }

    /// Returns the textual rendering used for comparisons and wire pairs.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(t) => t.clone(),
            Self::List(l) => l.join(","),
            Self::Flag(f) => f.to_string(),
            Self::Binary { file_name, .. } => file_name.clone(),
        }
    }
}

/// An insertion-ordered field mapping.
///
/// Multiple same-named fields accumulate into a list rather than
/// overwriting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no field was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the value for a field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Inserts a value, accumulating same-named textual values into a
    /// list. Binary values keep their own entry.
    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if matches!(value, FieldValue::Binary { .. }) {
            self.entries.push((name, value));
            return;
        }

        let position = self.entries.iter().position(|(n, existing)| {
            *n == name && !matches!(existing, FieldValue::Binary { .. })
        });
        match position {
            None => self.entries.push((name, value)),
            Some(index) => {
                let existing = &mut self.entries[index].1;
                let mut items = match existing.clone() {
                    FieldValue::List(items) => items,
                    other => vec![other.as_text()],
                };
                match value {
                    FieldValue::List(more) => items.extend(more),
                    other => items.push(other.as_text()),
                }
                *existing = FieldValue::List(items);
            }
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.push(name, value);
        }
        map
    }
}

/// The result of data collection for one run.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// The resolved collection source, if any.
    pub source: Option<Element>,
    /// The extracted field mapping.
    pub data: FieldMap,
}

/// Resolves the collection source for an acting element.
///
/// # Errors
///
/// `closest:` specs that match no ancestor are caller errors and fail
/// hard with a `Config` error.
pub fn resolve_collect_source(
    element: Option<&Element>,
    collect_option: Option<&str>,
    document: &Document,
) -> Result<Option<Element>, UplinkError> {
    match collect_option {
        Some("none") => Ok(None),
        Some(spec) if spec.starts_with("closest:") => {
            let selector = &spec["closest:".len()..];
            let found = element.and_then(|el| el.closest(selector));
            found.map(Some).ok_or_else(|| {
                UplinkError::config(format!("collect target \"{spec}\" not found"))
            })
        }
        Some("self") => Ok(element.cloned()),
        Some(spec) if !spec.is_empty() => {
            Ok(document.query_selector(&normalize_selector(spec)))
        }
        _ => {
            let Some(element) = element else {
                return Ok(None);
            };
            if element.is_form_like() {
                return Ok(Some(element.clone()));
            }
            if let Some(form) = element.closest("form") {
                return Ok(Some(form));
            }
            Ok(Some(element.clone()))
        }
    }
}

/// Collects field data for a run.
pub fn collect(
    element: Option<&Element>,
    collect_option: Option<&str>,
    document: &Document,
    hooks: &HookRegistry,
    adapters: &AdapterRegistry,
) -> Result<Collected, UplinkError> {
    let Some(source) = resolve_collect_source(element, collect_option, document)? else {
        return Ok(Collected::default());
    };

    // A named acting element collected as "self" contributes exactly its
    // own reading.
    let self_only = element.map_or(false, |el| {
        source == *el && !el.is_form_like() && el.attr("name").is_some()
    });

    let mut data = FieldMap::new();
    if self_only {
        if let Some((name, value)) = read_value(&source, document, hooks, adapters) {
            data.push(name, value);
        }
    } else {
        for field in named_fields(&source) {
            if let Some((name, value)) = read_value(&field, document, hooks, adapters) {
                data.push(name, value);
            }
        }
    }

    Ok(Collected {
        source: Some(source),
        data,
    })
}

fn named_fields(source: &Element) -> Vec<Element> {
    let mut fields = source.query_selector_all("[name]");
    if source.attr("name").is_some() {
        fields.insert(0, source.clone());
    }
    fields
}

/// Reads one field's name and value, or `None` when the field does not
/// contribute (unnamed, disabled, unchecked checkbox/radio).
pub fn read_value(
    element: &Element,
    document: &Document,
    hooks: &HookRegistry,
    adapters: &AdapterRegistry,
) -> Option<(String, FieldValue)> {
    let name = element.attr("name")?;
    if element.is_disabled() {
        return None;
    }

    // Custom value selector: data-uplink-value="#selector@attribute"
    if let Some(spec) = element.attr("data-uplink-value") {
        return Some((name, read_custom_value(&spec, document)));
    }

    // Named extractor registered by the embedding application
    if let Some(fn_name) = element.attr("data-uplink-value-fn") {
        match hooks.extractor(&fn_name) {
            Some(extractor) => return extractor(element).map(|value| (name, value)),
            None => {
                warn!(extractor = %fn_name, "value extractor not registered; ignoring");
            }
        }
    }

    // Widget adapters win over native semantics
    if let Some(adapter) = adapters.find(element) {
        return adapter.get_value(element).map(|value| (name, value));
    }

    native_value(element).map(|value| (name, value))
}

fn native_value(element: &Element) -> Option<FieldValue> {
    match element.tag().as_str() {
        "input" => match element.attr("type").as_deref() {
            Some("checkbox") => element.is_checked().then(|| {
                FieldValue::Text(element.value().unwrap_or_else(|| "on".to_string()))
            }),
            Some("radio") => element
                .is_checked()
                .then(|| FieldValue::Text(element.value().unwrap_or_default())),
            _ => Some(FieldValue::Text(element.value().unwrap_or_default())),
        },
        "select" => {
            let selected: Vec<String> = element
                .query_selector_all("option[selected]")
                .into_iter()
                .map(|opt| opt.value().unwrap_or_else(|| opt.text()))
                .collect();
            if element.has_attr("multiple") {
                Some(FieldValue::List(selected))
            } else {
                Some(FieldValue::Text(selected.into_iter().next().unwrap_or_default()))
            }
        }
        "textarea" => Some(FieldValue::Text(
            element.value().unwrap_or_else(|| element.text()),
        )),
        "button" => Some(FieldValue::Text(element.value().unwrap_or_default())),
        _ => None,
    }
}

/// Reads a value through a custom selector spec.
///
/// Format: `selector@attribute`; without `@attribute` the target's value
/// attribute is read, falling back to its text content.
fn read_custom_value(spec: &str, document: &Document) -> FieldValue {
    let (selector, attribute) = match spec.rfind('@') {
        Some(index) if index > 0 => (&spec[..index], Some(&spec[index + 1..])),
        _ => (spec, None),
    };

    let Some(target) = document.query_selector(&normalize_selector(selector)) else {
        return FieldValue::Text(String::new());
    };

    let value = match attribute {
        None | Some("value") => target.value().unwrap_or_else(|| target.text()),
        Some("textContent" | "text") => target.text(),
        Some(attr) => target.attr(attr).unwrap_or_default(),
    };
    FieldValue::Text(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRegistry;
    use crate::validation::adapters::AdapterRegistry;
    use std::sync::Arc;

    fn services() -> (Document, HookRegistry, AdapterRegistry) {
        (Document::new(), HookRegistry::new(), AdapterRegistry::new())
    }

    fn input(name: &str, value: &str) -> Element {
        let el = Element::new("input");
        el.set_attr("name", name);
        el.set_value(value);
        el
    }

    #[test]
    fn test_field_map_accumulates_same_names() {
        let mut map = FieldMap::new();
        map.push("tag", FieldValue::text("a"));
        map.push("tag", FieldValue::text("b"));
        map.push("other", FieldValue::text("c"));

        assert_eq!(
            map.get("tag"),
            Some(&FieldValue::List(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_resolve_none() {
        let (doc, _, _) = services();
        let el = input("q", "");
        assert!(resolve_collect_source(Some(&el), Some("none"), &doc)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_resolve_closest_missing_is_hard_error() {
        let (doc, _, _) = services();
        let el = input("q", "");
        doc.root().append_child(&el);

        let err = resolve_collect_source(Some(&el), Some("closest:.panel"), &doc).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_resolve_defaults_to_enclosing_form() {
        let (doc, _, _) = services();
        let form = Element::new("form");
        let button = Element::new("button");
        form.append_child(&button);
        doc.root().append_child(&form);

        let source = resolve_collect_source(Some(&button), None, &doc).unwrap();
        assert_eq!(source, Some(form));
    }

    #[test]
    fn test_collect_form_values() {
        let (doc, hooks, adapters) = services();
        let form = Element::new("form");
        form.append_child(&input("email", "a@b.c"));
        let disabled = input("secret", "x");
        disabled.set_disabled(true);
        form.append_child(&disabled);
        doc.root().append_child(&form);

        let collected = collect(Some(&form), None, &doc, &hooks, &adapters).unwrap();
        assert_eq!(collected.data.get("email"), Some(&FieldValue::text("a@b.c")));
        assert!(collected.data.get("secret").is_none());
    }

    #[test]
    fn test_collect_self_named_element() {
        let (doc, hooks, adapters) = services();
        let el = input("q", "search term");
        doc.root().append_child(&el);

        let collected = collect(Some(&el), Some("self"), &doc, &hooks, &adapters).unwrap();
        assert_eq!(collected.data.get("q"), Some(&FieldValue::text("search term")));
        assert_eq!(collected.data.len(), 1);
    }

    #[test]
    fn test_unchecked_checkbox_is_absent() {
        let (doc, hooks, adapters) = services();
        let el = Element::new("input");
        el.set_attr("type", "checkbox");
        el.set_attr("name", "agree");
        doc.root().append_child(&el);

        assert!(read_value(&el, &doc, &hooks, &adapters).is_none());

        el.set_checked(true);
        assert_eq!(
            read_value(&el, &doc, &hooks, &adapters),
            Some(("agree".to_string(), FieldValue::text("on")))
        );
    }

    #[test]
    fn test_multi_select_produces_list() {
        let (doc, hooks, adapters) = services();
        let select = Element::new("select");
        select.set_attr("name", "tags");
        select.set_attr("multiple", "");
        for (value, selected) in [("a", true), ("b", false), ("c", true)] {
            let option = Element::new("option");
            option.set_value(value);
            if selected {
                option.set_attr("selected", "");
            }
            select.append_child(&option);
        }
        doc.root().append_child(&select);

        assert_eq!(
            read_value(&select, &doc, &hooks, &adapters),
            Some((
                "tags".to_string(),
                FieldValue::List(vec!["a".to_string(), "c".to_string()])
            ))
        );
    }

    #[test]
    fn test_custom_value_selector() {
        let (doc, hooks, adapters) = services();
        let hidden = Element::new("span");
        hidden.set_attr("id", "picked");
        hidden.set_attr("data-date", "2024-06-01");
        doc.root().append_child(&hidden);

        let el = input("date", "");
        el.set_attr("data-uplink-value", "#picked@data-date");
        doc.root().append_child(&el);

        assert_eq!(
            read_value(&el, &doc, &hooks, &adapters),
            Some(("date".to_string(), FieldValue::text("2024-06-01")))
        );
    }

    #[test]
    fn test_named_extractor_and_missing_extractor() {
        let (doc, hooks, adapters) = services();
        hooks.register_extractor(
            "pick_answer",
            Arc::new(|_el: &Element| Some(FieldValue::text("42"))),
        );

        let el = input("answer", "ignored");
        el.set_attr("data-uplink-value-fn", "pick_answer");
        doc.root().append_child(&el);

        assert_eq!(
            read_value(&el, &doc, &hooks, &adapters),
            Some(("answer".to_string(), FieldValue::text("42")))
        );

        // Unregistered extractor falls through to the native value
        el.set_attr("data-uplink-value-fn", "missing");
        assert_eq!(
            read_value(&el, &doc, &hooks, &adapters),
            Some(("answer".to_string(), FieldValue::text("ignored")))
        );
    }
}
