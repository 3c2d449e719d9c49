//! Small predicates shared across the SDK.

use serde_json::Value;

use crate::error::{Error, Result};

/// Whether a JSON value is "blank": null, false, or an empty string, array
/// or object. Numbers and `true` are never blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Whether an optional string is absent or empty.
pub fn is_blank_str(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

/// Whether a string is a (signed) integer literal.
pub fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Reject blank strings passed as a required argument.
pub fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be blank", name)));
    }
    Ok(())
}
