//! Argument validation against a tool's input schema.
//!
//! Rules, applied in order:
//! 1. Every field in `inputSchema.required` must be present and, if a string,
//!    not blank.
//! 2. Fields declared with `"type": "array"` but supplied as a string are
//!    parsed as JSON; when that fails the string is split on commas.
//! 3. Undeclared fields pass through unchanged.
//!
//! The caller's argument map is never mutated.

use crate::arguments::{ArgValue, ToolArguments};
use crate::protocol::ToolDescriptor;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

/// `None` only if the pattern fails to compile, in which case every
/// identifier is rejected.
static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| match Regex::new(r"^[a-zA-Z0-9_]+$") {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(error = %e, "Invalid identifier pattern");
            None
        }
    });

/// Error type for argument validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent, null or blank.
    #[error("Missing required argument '{0}'")]
    MissingRequiredArgument(String),

    /// A bare identifier contains characters outside `[a-zA-Z0-9_]`.
    #[error("Invalid {label}. Only alphanumeric characters and underscores are allowed.")]
    InvalidIdentifier { label: String, value: String },
}

/// Validate `raw` against `descriptor` and produce coerced arguments.
pub fn validate_arguments(
    descriptor: &ToolDescriptor,
    raw: &Map<String, Value>,
) -> Result<ToolArguments, ValidationError> {
    for field in descriptor.required_fields() {
        let blank = match raw.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if blank {
            return Err(ValidationError::MissingRequiredArgument(field.to_string()));
        }
    }

    let mut args = ToolArguments::new();
    for (name, value) in raw {
        if descriptor.properties().is_some_and(|p| p.contains_key(name)) {
            let coerced = match (descriptor.property_type(name), value) {
                (Some("array"), Value::String(s)) => coerce_array(s),
                _ => ArgValue::from(value.clone()),
            };
            args.insert_declared(name.clone(), coerced);
        } else {
            args.insert_passthrough(name.clone(), value.clone());
        }
    }

    Ok(args)
}

/// Interpret a string supplied for an array-typed field.
///
/// Valid JSON is taken as-is; anything else is split on commas with each
/// segment trimmed. Never fails.
pub fn coerce_array(raw: &str) -> ArgValue {
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed) => ArgValue::from(parsed),
        Err(_) => ArgValue::Array(
            raw.split(',')
                .map(|segment| ArgValue::String(segment.trim().to_string()))
                .collect(),
        ),
    }
}

/// Check that `value` is a bare SQL identifier.
pub fn validate_identifier<'a>(label: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    if IDENTIFIER.as_ref().is_some_and(|re| re.is_match(value)) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidIdentifier {
            label: label.to_string(),
            value: value.to_string(),
        })
    }
}
