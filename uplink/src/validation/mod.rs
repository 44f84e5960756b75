//! Client-side validation: attribute parsing, validator and adapter
//! registries, error display, and the touch-based trigger policy.

pub mod adapters;
mod attributes;
mod display;
mod engine;
mod result;
mod triggers;
mod validators;

pub use attributes::{parse_validation_attributes, ParsedValidation, ValidatorConfig};
pub use display::{find_field_by_name, find_message_span, ErrorDisplay};
pub use engine::{should_validate, ValidateOptions, ValidationEngine};
pub use result::{CombinedResult, ValidationResult};
pub use triggers::{FieldAction, FieldTriggers};
pub use validators::{ValidatorFn, ValidatorRegistry};
