//! Record and field value helpers
//!
//! A form submission is a [`Record`]: a JSON object keyed by field name.
//! A field missing from the record is treated as undefined, which is distinct
//! from a field explicitly set to `null`.

use serde_json::{Map, Number, Value};

/// The incoming form data being filtered and validated
pub type Record = Map<String, Value>;

/// Render a value as the text a string rule operates on
///
/// Null becomes the empty string; numbers and booleans use their plain
/// textual form; arrays join their elements with commas; objects render as
/// JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Interpret a value as a number, if it has an unambiguous numeric reading
///
/// Blank strings have no numeric reading.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
        _ => None,
    }
}

/// Build a JSON number from a float, preferring an integer representation
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Loose equality between a submitted value and a reference value
///
/// - identical JSON values are equal
/// - null only equals null
/// - a number, bool or string compared with a number or bool compares
///   numerically (a blank string is never numerically equal)
/// - a string compared with an array compares against the array's
///   comma-joined text
/// - objects and arrays are otherwise never loosely equal to anything but
///   an identical value
pub fn loose_eq(value: &Value, other: &Value) -> bool {
    if value == other {
        return true;
    }

    match (value, other) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(_) | Value::Bool(_), _) | (_, Value::Number(_) | Value::Bool(_)) => {
            match (to_number(value), to_number(other)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (Value::String(s), Value::Array(_)) => *s == to_text(other),
        (Value::Array(_), Value::String(s)) => to_text(value) == *s,
        _ => false,
    }
}
