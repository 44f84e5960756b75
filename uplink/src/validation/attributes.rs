//! Parsing of per-field constraint attributes.
//!
//! A field is validatable only when it carries `data-val="true"`. Each
//! `data-val-<name>` attribute declares one constraint with its message;
//! `data-val-<name>-<param>` attributes merge into that constraint's
//! parameter map by name prefix.

use crate::dom::Element;
use std::collections::BTreeMap;

const VAL_ATTR: &str = "data-val";
const VAL_PREFIX: &str = "data-val-";

/// One declared constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// The validator name (e.g. "required", "minlength").
    pub name: String,
    /// The declared error message.
    pub message: String,
    /// Parameters merged from sub-attributes (e.g. "min" -> "5").
    pub params: BTreeMap<String, String>,
}

/// The parsed constraint set of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedValidation {
    /// Whether the field opted into validation.
    pub enabled: bool,
    /// Constraints in declaration order.
    pub validators: Vec<ValidatorConfig>,
}

/// Parses the constraint attributes of a field.
#[must_use]
pub fn parse_validation_attributes(element: &Element) -> ParsedValidation {
    if element.attr(VAL_ATTR).as_deref() != Some("true") {
        return ParsedValidation::default();
    }

    let mut order: Vec<String> = Vec::new();
    let mut configs: BTreeMap<String, ValidatorConfig> = BTreeMap::new();

    for (attr_name, attr_value) in element.attrs() {
        let Some(remainder) = attr_name.strip_prefix(VAL_PREFIX) else {
            continue;
        };

        match remainder.split_once('-') {
            None => {
                // Main constraint attribute; a repeated declaration's
                // message wins last.
                if !configs.contains_key(remainder) {
                    order.push(remainder.to_string());
                }
                configs
                    .entry(remainder.to_string())
                    .or_insert_with(|| ValidatorConfig {
                        name: remainder.to_string(),
                        message: String::new(),
                        params: BTreeMap::new(),
                    })
                    .message = attr_value;
            }
            Some((validator_name, param_name)) => {
                if !configs.contains_key(validator_name) {
                    order.push(validator_name.to_string());
                }
                configs
                    .entry(validator_name.to_string())
                    .or_insert_with(|| ValidatorConfig {
                        name: validator_name.to_string(),
                        message: String::new(),
                        params: BTreeMap::new(),
                    })
                    .params
                    .insert(param_name.to_string(), attr_value);
            }
        }
    }

    ParsedValidation {
        enabled: true,
        validators: order
            .into_iter()
            .filter_map(|name| configs.remove(&name))
            .collect(),
    }
}
