//! A small selector engine for element-tree queries.
//!
//! Supports compound simple selectors: `tag`, `#id`, `.class`, `[attr]`,
//! `[attr="value"]`, and combinations thereof (`input.cls[name="x"]`).
//! Combinators are rejected; every selector the engine generates itself
//! stays within this subset.

use crate::dom::Element;
use crate::errors::UplinkError;

/// A parsed compound simple selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    /// Required tag name, lowercase.
    pub tag: Option<String>,
    /// Required id.
    pub id: Option<String>,
    /// Required classes.
    pub classes: Vec<String>,
    /// Required attributes, optionally with an exact value.
    pub attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    /// Parses a selector string.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error for empty input, combinators, or
    /// malformed attribute brackets.
    pub fn parse(input: &str) -> Result<Self, UplinkError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UplinkError::config("empty selector"));
        }
        if input.chars().any(|c| c.is_whitespace() || c == '>' || c == '~' || c == '+' || c == ',') {
            return Err(UplinkError::config(format!(
                "unsupported selector \"{input}\": combinators are not supported"
            )));
        }

        let mut selector = Self::default();
        let mut chars = input.char_indices().peekable();

        // Optional leading tag name
        if let Some(&(_, c)) = chars.peek() {
            if c.is_ascii_alphabetic() || c == '*' {
                let mut tag = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*' {
                        tag.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if tag != "*" {
                    selector.tag = Some(tag.to_ascii_lowercase());
                }
            }
        }

        while let Some((_, c)) = chars.next() {
            match c {
                '#' => {
                    let ident = take_ident(&mut chars);
                    if ident.is_empty() {
                        return Err(UplinkError::config(format!("bad id in selector \"{input}\"")));
                    }
                    selector.id = Some(ident);
                }
                '.' => {
                    let ident = take_ident(&mut chars);
                    if ident.is_empty() {
                        return Err(UplinkError::config(format!(
                            "bad class in selector \"{input}\""
                        )));
                    }
                    selector.classes.push(ident);
                }
                '[' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(UplinkError::config(format!(
                            "unclosed attribute in selector \"{input}\""
                        )));
                    }
                    selector.attrs.push(parse_attr(&inner, input)?);
                }
                _ => {
                    return Err(UplinkError::config(format!(
                        "unexpected '{c}' in selector \"{input}\""
                    )));
                }
            }
        }

        Ok(selector)
    }

    /// Returns true if the element satisfies every part of the selector.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(ref tag) = self.tag {
            if element.tag() != *tag {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if element.attr("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        for class in &self.classes {
            if !element.has_class(class) {
                return false;
            }
        }
        for (name, value) in &self.attrs {
            match (element.attr(name), value) {
                (Some(actual), Some(expected)) if actual == *expected => {}
                (Some(_), None) => {}
                _ => return false,
            }
        }
        true
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_attr(inner: &str, whole: &str) -> Result<(String, Option<String>), UplinkError> {
    match inner.split_once('=') {
        None => {
            if inner.is_empty() {
                return Err(UplinkError::config(format!(
                    "empty attribute in selector \"{whole}\""
                )));
            }
            Ok((inner.to_string(), None))
        }
        Some((name, raw)) => {
            let value = raw.trim_matches(|c| c == '"' || c == '\'');
            Ok((name.to_string(), Some(value.to_string())))
        }
    }
}

/// Normalizes a shorthand target reference into a selector.
///
/// Bare identifiers are treated as element ids; anything already starting
/// with `#`, `.` or `[` is passed through unchanged.
#[must_use]
pub fn normalize_selector(selector: &str) -> String {
    let value = selector.trim();
    if value.is_empty() {
        return String::new();
    }
    if value.starts_with('#') || value.starts_with('.') || value.starts_with('[') {
        return value.to_string();
    }
    format!("#{value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn test_parse_tag_only() {
        let sel = Selector::parse("form").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("form"));
        assert!(sel.attrs.is_empty());
    }

    #[test]
    fn test_parse_compound() {
        let sel = Selector::parse("input.big[name=\"email\"]#main").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("input"));
        assert_eq!(sel.id.as_deref(), Some("main"));
        assert_eq!(sel.classes, vec!["big"]);
        assert_eq!(
            sel.attrs,
            vec![("name".to_string(), Some("email".to_string()))]
        );
    }

    #[test]
    fn test_parse_rejects_combinators() {
        assert!(Selector::parse("form input").is_err());
        assert!(Selector::parse("a > b").is_err());
        assert!(Selector::parse("").is_err());
    }

    #[test]
    fn test_matches_attr_presence_and_value() {
        let el = Element::new("input");
        el.set_attr("name", "email");

        assert!(Selector::parse("[name]").unwrap().matches(&el));
        assert!(Selector::parse("[name=\"email\"]").unwrap().matches(&el));
        assert!(!Selector::parse("[name=\"other\"]").unwrap().matches(&el));
        assert!(!Selector::parse("[missing]").unwrap().matches(&el));
    }

    #[test]
    fn test_matches_classes() {
        let el = Element::new("div");
        el.add_class("a");
        el.add_class("b");

        assert!(Selector::parse(".a.b").unwrap().matches(&el));
        assert!(!Selector::parse(".a.c").unwrap().matches(&el));
    }

    #[test]
    fn test_normalize_selector() {
        assert_eq!(normalize_selector("results"), "#results");
        assert_eq!(normalize_selector("#results"), "#results");
        assert_eq!(normalize_selector(".panel"), ".panel");
        assert_eq!(normalize_selector("[name=\"q\"]"), "[name=\"q\"]");
    }
}
