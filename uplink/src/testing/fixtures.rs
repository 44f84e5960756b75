//! Element-tree fixtures shared across tests.

use crate::dom::{Document, Element};

/// A document holding a marked button posting to `url`, targeting
/// `#results`.
#[must_use]
pub fn action_button(url: &str) -> (Document, Element, Element) {
    let document = Document::new();
    let button = Element::new("button");
    button.set_attr("data-uplink", "");
    button.set_attr("data-uplink-post", url);
    button.set_attr("data-uplink-target", "#results");
    document.root().append_child(&button);

    let results = Element::new("div");
    results.set_attr("id", "results");
    document.root().append_child(&results);

    (document, button, results)
}

/// A document holding a validated search form with one required field.
#[must_use]
pub fn search_form(action: &str) -> (Document, Element, Element) {
    let document = Document::new();
    let form = Element::new("form");
    form.set_attr("data-uplink", "");
    form.set_attr("data-uplink-validate", "true");
    form.set_attr("action", action);
    form.set_attr("method", "post");

    let input = Element::new("input");
    input.set_attr("name", "q");
    input.set_attr("data-val", "true");
    input.set_attr("data-val-required", "Required.");
    form.append_child(&input);

    let span = Element::new("span");
    span.set_attr("data-valmsg-for", "q");
    form.append_child(&span);

    document.root().append_child(&form);
    (document, form, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_shapes() {
        let (document, button, results) = action_button("/save");
        assert!(document.contains(&button));
        assert_eq!(document.query_selector("#results"), Some(results));

        let (document, form, input) = search_form("/search");
        assert!(document.contains(&form));
        assert!(input.attr("data-val").is_some());
    }
}
