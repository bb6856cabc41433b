//! Payload value coercion
//!
//! Request payloads are loosely typed JSON. Every cell read by the pipeline
//! goes through one of these functions so the substitution policy lives in
//! one place.

use serde_json::Value;

/// Outcome of coercing a payload cell to a number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    /// A finite number
    Value(f64),
    /// Absent, null or a blank string
    Missing,
    /// Present but not a finite number (wrong type, non-numeric string, inf/nan)
    Invalid,
}

impl Coerced {
    /// The number, or `None` for cells that must be imputed
    pub fn as_option(self) -> Option<f64> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Missing | Coerced::Invalid => None,
        }
    }

    pub fn is_invalid(self) -> bool {
        matches!(self, Coerced::Invalid)
    }
}

/// Coerce a payload cell to a float.
///
/// Numeric strings are accepted with surrounding whitespace.
/// Booleans, arrays and objects are [`Coerced::Invalid`].
pub fn coerce_number(value: Option<&Value>) -> Coerced {
    match value {
        None | Some(Value::Null) => Coerced::Missing,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Coerced::Value(v),
            _ => Coerced::Invalid,
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Coerced::Missing;
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Coerced::Value(v),
                _ => Coerced::Invalid,
            }
        }
        Some(_) => Coerced::Invalid,
    }
}

/// Category label for a payload cell, `None` when it has to fall back to the
/// unknown bucket.
///
/// Strings are used verbatim, numbers and booleans are stringified.
pub fn category_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether a cell counts as provided when choosing between it and a default
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
