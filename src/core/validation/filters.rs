//! Built-in field filters
//!
//! Each filter takes the current field value plus the arguments captured
//! when the chain was built, and returns the new field value. String
//! filters leave non-string values untouched; conversion filters read any
//! value through its text form.

use super::args;
use crate::core::field::{number_value, to_text};
use anyhow::{Result, anyhow};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn map_str(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

fn trim_with(value: Value, args: &[Value], left: bool, right: bool) -> Value {
    let chars = args::optional_text(args, 0);
    map_str(value, |s| {
        let is_trimmed = |c: char| match &chars {
            Some(set) => set.contains(c),
            None => c.is_whitespace(),
        };
        let mut out = s;
        if left {
            out = out.trim_start_matches(is_trimmed);
        }
        if right {
            out = out.trim_end_matches(is_trimmed);
        }
        out.to_string()
    })
}

/// Filter: strip whitespace (or the given characters) from both ends
pub fn trim(value: Value, args: &[Value]) -> Result<Value> {
    Ok(trim_with(value, args, true, true))
}

/// Filter: strip whitespace (or the given characters) from the start
pub fn ltrim(value: Value, args: &[Value]) -> Result<Value> {
    Ok(trim_with(value, args, true, false))
}

/// Filter: strip whitespace (or the given characters) from the end
pub fn rtrim(value: Value, args: &[Value]) -> Result<Value> {
    Ok(trim_with(value, args, false, true))
}

/// Filter: replace null, undefined or empty values with a replacement
pub fn if_null(value: Value, args: &[Value]) -> Result<Value> {
    let replacement = args::required("if_null", args, 0).map_err(|e| anyhow!(e))?;
    match &value {
        Value::Null => Ok(replacement.clone()),
        Value::String(s) if s.is_empty() => Ok(replacement.clone()),
        _ => Ok(value),
    }
}

fn leading_float(text: &str) -> Option<f64> {
    static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();
    let regex = FLOAT_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("float prefix regex")
    });
    regex
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn leading_int(text: &str) -> Option<i64> {
    static INT_PREFIX: OnceLock<Regex> = OnceLock::new();
    let regex = INT_PREFIX.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("int prefix regex"));
    regex
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Filter: parse the leading float; unparsable becomes null
pub fn to_float(value: Value, _: &[Value]) -> Result<Value> {
    if value.is_number() {
        return Ok(value);
    }
    Ok(leading_float(&to_text(&value))
        .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
        .unwrap_or(Value::Null))
}

/// Filter: parse the leading integer; unparsable becomes null
pub fn to_int(value: Value, _: &[Value]) -> Result<Value> {
    if let Some(n) = value.as_f64() {
        return Ok(number_value(n.trunc()));
    }
    Ok(leading_int(&to_text(&value))
        .map(Value::from)
        .unwrap_or(Value::Null))
}

/// Filter: false for "", "0", "false" and null, true otherwise
pub fn to_boolean(value: Value, _: &[Value]) -> Result<Value> {
    if let Value::Bool(_) = value {
        return Ok(value);
    }
    let text = to_text(&value);
    let falsy = text.is_empty() || text == "0" || text.eq_ignore_ascii_case("false");
    Ok(Value::Bool(!falsy))
}

/// Filter: true only for "1" and "true"
pub fn to_boolean_strict(value: Value, _: &[Value]) -> Result<Value> {
    if let Value::Bool(_) = value {
        return Ok(value);
    }
    let text = to_text(&value);
    Ok(Value::Bool(text == "1" || text == "true"))
}

/// Filter: convert string to lowercase
pub fn to_lower(value: Value, _: &[Value]) -> Result<Value> {
    Ok(map_str(value, str::to_lowercase))
}

/// Filter: convert string to uppercase
pub fn to_upper(value: Value, _: &[Value]) -> Result<Value> {
    Ok(map_str(value, str::to_uppercase))
}

/// Filter: keep at most `length` characters
///
/// A length of zero or below empties the string.
pub fn truncate(value: Value, args: &[Value]) -> Result<Value> {
    let length = args::required_number("truncate", args, 0).map_err(|e| anyhow!(e))?;
    let keep = if length <= 0.0 { 0 } else { length as usize };
    Ok(map_str(value, |s| {
        if s.chars().count() > keep {
            s.chars().take(keep).collect()
        } else {
            s.to_string()
        }
    }))
}

/// Filter: HTML-escape `& < > " '`
pub fn escape(value: Value, _: &[Value]) -> Result<Value> {
    Ok(map_str(value, |s| {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#x27;"),
                _ => out.push(c),
            }
        }
        out
    }))
}

/// Filter: decode the entities produced by [`escape`]
pub fn entity_decode(value: Value, _: &[Value]) -> Result<Value> {
    Ok(map_str(value, |s| {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#x27;", "'")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }))
}
