//! Element handles for the application-owned UI tree.
//!
//! Elements are cheap shared handles (`Arc` inside); cloning a handle
//! never clones the node. Identity is the node, not the data: two handles
//! compare equal when they point at the same node. Parent links are weak,
//! so dropping a subtree's last external handle releases it.

use super::selector::Selector;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

struct ElementInner {
    id: u64,
    tag: String,
    // Insertion-ordered so declared constraint order is observable.
    attrs: RwLock<Vec<(String, String)>>,
    children: RwLock<Vec<Element>>,
    parent: RwLock<Weak<ElementInner>>,
    text: RwLock<String>,
    selection: RwLock<Option<(usize, usize)>>,
}

/// A shared handle to a node in the element tree.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

/// A weak handle to an element, used where the engine must not keep a
/// detached subtree alive (e.g. the pipeline context's acting element).
#[derive(Clone, Default)]
pub struct WeakElement {
    inner: Weak<ElementInner>,
}

impl WeakElement {
    /// Attempts to upgrade to a strong handle.
    #[must_use]
    pub fn upgrade(&self) -> Option<Element> {
        self.inner.upgrade().map(|inner| Element { inner })
    }
}

impl Element {
    /// Creates a new detached element.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
                tag: tag.into().to_ascii_lowercase(),
                attrs: RwLock::new(Vec::new()),
                children: RwLock::new(Vec::new()),
                parent: RwLock::new(Weak::new()),
                text: RwLock::new(String::new()),
                selection: RwLock::new(None),
            }),
        }
    }

    /// Returns the process-unique node id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Returns the lowercase tag name.
    #[must_use]
    pub fn tag(&self) -> String {
        self.inner.tag.clone()
    }

    /// Returns a weak handle to this element.
    #[must_use]
    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ---- attributes ----

    /// Returns the attribute value, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.inner
            .attrs
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.inner.attrs.read().iter().any(|(n, _)| n == name)
    }

    /// Sets an attribute, replacing any existing value in place.
    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut attrs = self.inner.attrs.write();
        match attrs.iter().position(|(n, _)| *n == name) {
            Some(index) => attrs[index].1 = value,
            None => attrs.push((name, value)),
        }
    }

    /// Removes an attribute.
    pub fn remove_attr(&self, name: &str) {
        self.inner.attrs.write().retain(|(n, _)| n != name);
    }

    /// Returns all attributes in declaration order.
    #[must_use]
    pub fn attrs(&self) -> Vec<(String, String)> {
        self.inner.attrs.read().clone()
    }

    // ---- classes ----

    /// Returns the class list.
    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns true if the element carries the class.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    /// Adds a class if not already present.
    pub fn add_class(&self, class: &str) {
        let mut classes = self.classes();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.set_attr("class", classes.join(" "));
        }
    }

    /// Removes a class.
    pub fn remove_class(&self, class: &str) {
        let classes: Vec<String> = self.classes().into_iter().filter(|c| c != class).collect();
        if classes.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", classes.join(" "));
        }
    }

    /// Replaces the whole class list.
    pub fn set_classes(&self, classes: &[String]) {
        if classes.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", classes.join(" "));
        }
    }

    // ---- text / value ----

    /// Returns the element's text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.inner.text.read().clone()
    }

    /// Sets the element's text content.
    pub fn set_text(&self, text: impl Into<String>) {
        *self.inner.text.write() = text.into();
    }

    /// Returns the control's current value (the `value` attribute).
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.attr("value")
    }

    /// Sets the control's current value.
    pub fn set_value(&self, value: impl Into<String>) {
        self.set_attr("value", value);
    }

    /// Returns true if the control is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.has_attr("disabled")
    }

    /// Sets or clears the disabled flag.
    pub fn set_disabled(&self, disabled: bool) {
        if disabled {
            self.set_attr("disabled", "");
        } else {
            self.remove_attr("disabled");
        }
    }

    /// Returns true if a checkbox/radio control is checked.
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.has_attr("checked")
    }

    /// Sets or clears the checked flag.
    pub fn set_checked(&self, checked: bool) {
        if checked {
            self.set_attr("checked", "");
        } else {
            self.remove_attr("checked");
        }
    }

    /// Returns the text selection range, for text-entry controls.
    #[must_use]
    pub fn selection(&self) -> Option<(usize, usize)> {
        *self.inner.selection.read()
    }

    /// Sets the text selection range.
    pub fn set_selection(&self, start: usize, end: usize) {
        *self.inner.selection.write() = Some((start, end));
    }

    // ---- tree ----

    /// Returns the parent element, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        self.inner.parent.read().upgrade().map(|inner| Element { inner })
    }

    /// Returns the direct children.
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.inner.children.read().clone()
    }

    /// Appends a child, reparenting it onto this element.
    pub fn append_child(&self, child: &Element) {
        *child.inner.parent.write() = Arc::downgrade(&self.inner);
        self.inner.children.write().push(child.clone());
    }

    /// Removes all children.
    pub fn clear_children(&self) {
        let mut children = self.inner.children.write();
        for child in children.iter() {
            *child.inner.parent.write() = Weak::new();
        }
        children.clear();
    }

    /// Replaces this element with another in its parent's child list.
    ///
    /// Returns false when detached.
    pub fn replace_with(&self, replacement: &Element) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        let mut children = parent.inner.children.write();
        let Some(index) = children.iter().position(|c| c.id() == self.id()) else {
            return false;
        };
        *replacement.inner.parent.write() = Arc::downgrade(&parent.inner);
        *self.inner.parent.write() = Weak::new();
        children[index] = replacement.clone();
        true
    }

    /// Returns true if `other` is this element or one of its descendants.
    #[must_use]
    pub fn contains(&self, other: &Element) -> bool {
        if self.id() == other.id() {
            return true;
        }
        let mut node = other.parent();
        while let Some(current) = node {
            if current.id() == self.id() {
                return true;
            }
            node = current.parent();
        }
        false
    }

    // ---- queries ----

    /// Returns true if the element matches the selector.
    ///
    /// Unparseable selectors never match.
    #[must_use]
    pub fn matches(&self, selector: &str) -> bool {
        Selector::parse(selector).map_or(false, |s| s.matches(self))
    }

    /// Returns the nearest ancestor-or-self matching the selector.
    #[must_use]
    pub fn closest(&self, selector: &str) -> Option<Element> {
        let parsed = Selector::parse(selector).ok()?;
        let mut node = Some(self.clone());
        while let Some(current) = node {
            if parsed.matches(&current) {
                return Some(current);
            }
            node = current.parent();
        }
        None
    }

    /// Returns the first descendant matching the selector, depth-first.
    #[must_use]
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        let parsed = Selector::parse(selector).ok()?;
        self.descendants().find(|el| parsed.matches(el))
    }

    /// Returns all descendants matching the selector, depth-first.
    #[must_use]
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Ok(parsed) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.descendants().filter(|el| parsed.matches(el)).collect()
    }

    fn descendants(&self) -> impl Iterator<Item = Element> {
        let mut stack: Vec<Element> = self.children().into_iter().rev().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            for child in next.children().into_iter().rev() {
                stack.push(child);
            }
            Some(next)
        })
    }

    // ---- element kinds & visibility ----

    /// Returns true for form containers.
    #[must_use]
    pub fn is_form_like(&self) -> bool {
        self.inner.tag == "form"
    }

    /// Returns true for native value-bearing controls.
    #[must_use]
    pub fn is_input_like(&self) -> bool {
        matches!(self.inner.tag.as_str(), "input" | "select" | "textarea")
    }

    /// Returns true for button-style controls whose text content is safe
    /// to snapshot and restore.
    #[must_use]
    pub fn is_button_like(&self) -> bool {
        self.inner.tag == "button"
            || (self.inner.tag == "input"
                && matches!(
                    self.attr("type").as_deref(),
                    Some("button") | Some("submit") | Some("reset")
                ))
    }

    /// Returns true unless the element itself declares it is hidden.
    ///
    /// The headless tree has no style cascade; visibility follows the
    /// element's own `hidden` attribute and inline `style` only.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        if self.has_attr("hidden") {
            return false;
        }
        if let Some(style) = self.attr("style") {
            let squashed: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            if squashed.contains("display:none") || squashed.contains("visibility:hidden") {
                return false;
            }
        }
        true
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.inner.id)
            .field("tag", &self.inner.tag)
            .field("attrs", &*self.inner.attrs.read())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.upgrade() {
            Some(el) => write!(f, "WeakElement({} <{}>)", el.id(), el.tag()),
            None => write!(f, "WeakElement(dropped)"),
        }
    }
}

/// The element tree root plus document-level state (focus tracking).
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

struct DocumentInner {
    root: Element,
    focused: RwLock<Option<Element>>,
}

impl Document {
    /// Creates a document with an empty `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(Element::new("body"))
    }

    /// Creates a document around an existing root element.
    #[must_use]
    pub fn with_root(root: Element) -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                root,
                focused: RwLock::new(None),
            }),
        }
    }

    /// Returns the root element.
    #[must_use]
    pub fn root(&self) -> Element {
        self.inner.root.clone()
    }

    /// Returns the first matching element in the document, root included.
    #[must_use]
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        if self.inner.root.matches(selector) {
            return Some(self.inner.root.clone());
        }
        self.inner.root.query_selector(selector)
    }

    /// Returns all matching elements in the document, root included.
    #[must_use]
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let mut results = Vec::new();
        if self.inner.root.matches(selector) {
            results.push(self.inner.root.clone());
        }
        results.extend(self.inner.root.query_selector_all(selector));
        results
    }

    /// Resolves a shorthand reference (`results` -> `#results`).
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<Element> {
        let selector = super::selector::normalize_selector(reference);
        if selector.is_empty() {
            return None;
        }
        self.query_selector(&selector)
    }

    /// Moves keyboard focus to the element.
    pub fn focus(&self, element: &Element) {
        *self.inner.focused.write() = Some(element.clone());
    }

    /// Clears keyboard focus.
    pub fn blur(&self) {
        *self.inner.focused.write() = None;
    }

    /// Returns the currently focused element, dropping it if it has been
    /// detached from the tree.
    #[must_use]
    pub fn active_element(&self) -> Option<Element> {
        let focused = self.inner.focused.read().clone()?;
        if self.inner.root.contains(&focused) {
            Some(focused)
        } else {
            None
        }
    }

    /// Returns true if the element is attached to this document.
    #[must_use]
    pub fn contains(&self, element: &Element) -> bool {
        self.inner.root.contains(element)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.inner.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (Document, Element, Element) {
        let doc = Document::new();
        let form = Element::new("form");
        form.set_attr("id", "signup");
        let input = Element::new("input");
        input.set_attr("name", "email");
        form.append_child(&input);
        doc.root().append_child(&form);
        (doc, form, input)
    }

    #[test]
    fn test_identity_equality() {
        let a = Element::new("div");
        let b = a.clone();
        let c = Element::new("div");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_closest_includes_self() {
        let (_doc, form, input) = small_tree();
        assert_eq!(input.closest("form"), Some(form.clone()));
        assert_eq!(form.closest("form"), Some(form));
        assert!(input.closest(".missing").is_none());
    }

    #[test]
    fn test_query_selector_excludes_self() {
        let (_doc, form, input) = small_tree();
        assert_eq!(form.query_selector("[name=\"email\"]"), Some(input));
        assert!(form.query_selector("form").is_none());
    }

    #[test]
    fn test_document_query_includes_root() {
        let doc = Document::with_root(Element::new("form"));
        assert!(doc.query_selector("form").is_some());
    }

    #[test]
    fn test_replace_with() {
        let (doc, _form, input) = small_tree();
        let replacement = Element::new("span");
        assert!(input.replace_with(&replacement));
        assert!(doc.query_selector("[name=\"email\"]").is_none());
        assert!(doc.query_selector("span").is_some());
        assert!(input.parent().is_none());
    }

    #[test]
    fn test_contains_and_focus_drop_on_detach() {
        let (doc, form, input) = small_tree();
        doc.focus(&input);
        assert_eq!(doc.active_element(), Some(input.clone()));

        form.clear_children();
        assert!(doc.active_element().is_none());
    }

    #[test]
    fn test_class_helpers() {
        let el = Element::new("button");
        el.add_class("busy");
        el.add_class("busy");
        assert_eq!(el.classes(), vec!["busy"]);

        el.remove_class("busy");
        assert!(!el.has_attr("class"));
    }

    #[test]
    fn test_visibility() {
        let el = Element::new("input");
        assert!(el.is_visible());

        el.set_attr("style", "display: none");
        assert!(!el.is_visible());

        el.set_attr("style", "color: red");
        assert!(el.is_visible());

        el.set_attr("hidden", "");
        assert!(!el.is_visible());
    }

    #[test]
    fn test_weak_element() {
        let el = Element::new("div");
        let weak = el.downgrade();
        assert!(weak.upgrade().is_some());
        drop(el);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_attr_order_preserved() {
        let el = Element::new("input");
        el.set_attr("data-val-required", "Required.");
        el.set_attr("data-val-minlength", "Too short.");
        el.set_attr("data-val-required", "Still required.");

        let names: Vec<String> = el.attrs().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["data-val-required", "data-val-minlength"]);
    }
}
