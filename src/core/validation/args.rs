//! Positional argument access for rule handlers
//!
//! Rules receive their call-time arguments as a slice of JSON values.
//! These helpers read one argument with the shape a rule expects and
//! describe the problem when it is missing or mistyped.

use crate::core::field::{to_number, to_text};
use serde_json::Value;

/// Argument at `index`, treating `null` as absent
pub fn optional(args: &[Value], index: usize) -> Option<&Value> {
    args.get(index).filter(|v| !v.is_null())
}

/// Required argument at `index`
pub fn required<'a>(rule: &str, args: &'a [Value], index: usize) -> Result<&'a Value, String> {
    optional(args, index)
        .ok_or_else(|| format!("{} expects an argument at position {}", rule, index + 1))
}

/// Optional string argument; non-strings use their text form
pub fn optional_text(args: &[Value], index: usize) -> Option<String> {
    optional(args, index).map(to_text)
}

/// Required string argument
pub fn required_text(rule: &str, args: &[Value], index: usize) -> Result<String, String> {
    required(rule, args, index).map(to_text)
}

/// Required numeric argument
pub fn required_number(rule: &str, args: &[Value], index: usize) -> Result<f64, String> {
    let value = required(rule, args, index)?;
    to_number(value)
        .ok_or_else(|| format!("{} expects a number at position {}, got {}", rule, index + 1, value))
}

/// Optional numeric argument; present but non-numeric is an error
pub fn optional_number(rule: &str, args: &[Value], index: usize) -> Result<Option<f64>, String> {
    match optional(args, index) {
        None => Ok(None),
        Some(_) => required_number(rule, args, index).map(Some),
    }
}
