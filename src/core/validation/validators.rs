//! Built-in field validators
//!
//! A validator checks the field value against the parameters captured when
//! the chain was built. It either passes or returns a [`RuleFailure`]:
//! a rejection carrying the rule's default text, which a custom message
//! replaces, or a misconfiguration (bad rule parameters), reported as is.

use super::args;
use crate::core::field::{loose_eq, to_number, to_text};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};
use validator::{ValidateEmail, ValidateIp, ValidateUrl};

/// Default message of the `required` rule
pub const REQUIRED_MESSAGE: &str = "Field does not have a value.";

/// Why a validator did not pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleFailure {
    /// The value failed the check; carries the rule's default text
    Rejected(String),
    /// The rule could not run with the parameters it was given
    Misconfigured(String),
}

impl RuleFailure {
    pub fn rejected(message: impl Into<String>) -> Self {
        RuleFailure::Rejected(message.into())
    }

    /// Render the failure, preferring `custom` over a rejection's default text
    pub fn render(self, custom: Option<&str>) -> String {
        match self {
            RuleFailure::Rejected(default) => custom.map(str::to_string).unwrap_or(default),
            RuleFailure::Misconfigured(message) => message,
        }
    }
}

/// Result of one validator check
pub type Check = Result<(), RuleFailure>;

fn ensure(ok: bool, message: &str) -> Check {
    if ok {
        Ok(())
    } else {
        Err(RuleFailure::rejected(message))
    }
}

fn misconfigured(message: String) -> RuleFailure {
    RuleFailure::Misconfigured(message)
}

fn matches_static(cell: &'static OnceLock<Regex>, pattern: &str, text: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).expect("static validator regex"))
        .is_match(text)
}

/// Validator: fails for undefined, null, "" or a value loosely equal to the placeholder
pub fn required(value: &Value, args: &[Value]) -> Check {
    let empty = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    let is_placeholder = args::optional(args, 0).is_some_and(|p| loose_eq(value, p));
    ensure(!empty && !is_placeholder, REQUIRED_MESSAGE)
}

/// Validator: well-formed email address
pub fn is_email(value: &Value, _: &[Value]) -> Check {
    ensure(to_text(value).validate_email(), "Invalid email")
}

/// Validator: well-formed URL
pub fn is_url(value: &Value, _: &[Value]) -> Check {
    ensure(to_text(value).validate_url(), "Invalid URL")
}

/// Validator: IPv4 or IPv6 address
pub fn is_ip(value: &Value, _: &[Value]) -> Check {
    ensure(to_text(value).validate_ip(), "Invalid IP")
}

/// Validator: ASCII letters only
pub fn is_alpha(value: &Value, _: &[Value]) -> Check {
    static ALPHA: OnceLock<Regex> = OnceLock::new();
    ensure(
        matches_static(&ALPHA, r"^[a-zA-Z]+$", &to_text(value)),
        "Invalid characters",
    )
}

/// Validator: ASCII letters and digits only
pub fn is_alphanumeric(value: &Value, _: &[Value]) -> Check {
    static ALPHANUMERIC: OnceLock<Regex> = OnceLock::new();
    ensure(
        matches_static(&ALPHANUMERIC, r"^[a-zA-Z0-9]+$", &to_text(value)),
        "Invalid characters",
    )
}

/// Validator: optionally signed digits
pub fn is_numeric(value: &Value, _: &[Value]) -> Check {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    ensure(
        matches_static(&NUMERIC, r"^-?[0-9]+$", &to_text(value)),
        "Invalid number",
    )
}

/// Validator: integer without leading zeros
pub fn is_int(value: &Value, _: &[Value]) -> Check {
    static INT: OnceLock<Regex> = OnceLock::new();
    ensure(
        matches_static(&INT, r"^-?(?:0|[1-9][0-9]*)$", &to_text(value)),
        "Invalid integer",
    )
}

/// Validator: integer or decimal number
pub fn is_decimal(value: &Value, _: &[Value]) -> Check {
    static DECIMAL: OnceLock<Regex> = OnceLock::new();
    ensure(
        matches_static(
            &DECIMAL,
            r"^-?(?:(?:0|[1-9][0-9]*)(?:\.[0-9]*)?|\.[0-9]+)$",
            &to_text(value),
        ),
        "Invalid decimal",
    )
}

/// Validator: no uppercase characters
pub fn is_lowercase(value: &Value, _: &[Value]) -> Check {
    let text = to_text(value);
    ensure(text == text.to_lowercase(), "Invalid characters")
}

/// Validator: no lowercase characters
pub fn is_uppercase(value: &Value, _: &[Value]) -> Check {
    let text = to_text(value);
    ensure(text == text.to_uppercase(), "Invalid characters")
}

/// Validator: value is present and non-empty
pub fn not_null(value: &Value, _: &[Value]) -> Check {
    ensure(!to_text(value).is_empty(), "Invalid characters")
}

/// Validator: value is absent or empty
pub fn is_null(value: &Value, _: &[Value]) -> Check {
    ensure(to_text(value).is_empty(), "Invalid characters")
}

/// Validator: value has at least one non-whitespace character
pub fn not_empty(value: &Value, _: &[Value]) -> Check {
    ensure(!to_text(value).trim().is_empty(), "String is empty")
}

/// Validator: loosely equal to the expected value
pub fn equals(value: &Value, args: &[Value]) -> Check {
    let expected = args::optional(args, 0).unwrap_or(&Value::Null);
    ensure(loose_eq(value, expected), "Not equal")
}

/// Validator: text contains the needle
pub fn contains(value: &Value, args: &[Value]) -> Check {
    let needle = args::required_text("contains", args, 0).map_err(misconfigured)?;
    ensure(to_text(value).contains(&needle), "Invalid characters")
}

/// Validator: text does not contain the needle
pub fn not_contains(value: &Value, args: &[Value]) -> Check {
    let needle = args::required_text("not_contains", args, 0).map_err(misconfigured)?;
    ensure(!to_text(value).contains(&needle), "Invalid characters")
}

/// Compile `pattern` with `imsx` flags, once per distinct pattern and flags
///
/// Compiled patterns are kept for the life of the process, so a pipeline
/// shared by every request compiles its patterns on first use only.
pub fn compile_pattern(pattern: &str, flags: &str) -> Result<Regex, RuleFailure> {
    static PATTERNS: OnceLock<RwLock<HashMap<(String, String), Regex>>> = OnceLock::new();
    let cache = PATTERNS.get_or_init(|| RwLock::new(HashMap::new()));
    let key = (pattern.to_string(), flags.to_string());

    if let Some(re) = cache.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
        return Ok(re.clone());
    }

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'g' => &mut builder,
            other => {
                return Err(misconfigured(format!(
                    "Invalid regular expression flag '{}'",
                    other
                )));
            }
        };
    }

    let re = builder
        .build()
        .map_err(|e| misconfigured(format!("Invalid regular expression: {}", e)))?;
    cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, re.clone());
    Ok(re)
}

/// Compile the pattern and flags captured by a `regex` or `not_regex` rule
pub fn build_regex(rule: &str, args: &[Value]) -> Result<Regex, RuleFailure> {
    let pattern = args::required_text(rule, args, 0).map_err(misconfigured)?;
    let flags = args::optional_text(args, 1).unwrap_or_default();
    compile_pattern(&pattern, &flags)
}

/// Validator: text matches the pattern (with optional `imsx` flags)
pub fn regex(value: &Value, args: &[Value]) -> Check {
    let re = build_regex("regex", args)?;
    ensure(re.is_match(&to_text(value)), "Invalid characters")
}

/// Validator: text does not match the pattern
pub fn not_regex(value: &Value, args: &[Value]) -> Check {
    let re = build_regex("not_regex", args)?;
    ensure(!re.is_match(&to_text(value)), "Invalid characters")
}

/// Validator: character count within `min` and optional `max`
pub fn len(value: &Value, args: &[Value]) -> Check {
    let min = args::required_number("len", args, 0).map_err(misconfigured)?;
    let max = args::optional_number("len", args, 1).map_err(misconfigured)?;

    let count = to_text(value).chars().count() as f64;
    if count < min {
        return Err(RuleFailure::rejected("String is too small"));
    }
    if let Some(max) = max {
        if count > max {
            return Err(RuleFailure::rejected("String is too large"));
        }
    }
    Ok(())
}

/// Validator: UUID in any standard textual form
pub fn is_uuid(value: &Value, _: &[Value]) -> Check {
    ensure(uuid::Uuid::parse_str(&to_text(value)).is_ok(), "Not a UUID")
}

/// Validator: RFC 3339 timestamp or `YYYY-MM-DD` date
pub fn is_date(value: &Value, _: &[Value]) -> Check {
    let text = to_text(value);
    let parsed = chrono::DateTime::parse_from_rfc3339(&text).is_ok()
        || chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d").is_ok();
    ensure(parsed, "Not a date")
}

/// Validator: number not below the bound
pub fn min(value: &Value, args: &[Value]) -> Check {
    let bound = args::required_number("min", args, 0).map_err(misconfigured)?;
    ensure(to_number(value).is_some_and(|n| n >= bound), "Invalid number")
}

/// Validator: number not above the bound
pub fn max(value: &Value, args: &[Value]) -> Check {
    let bound = args::required_number("max", args, 0).map_err(misconfigured)?;
    ensure(to_number(value).is_some_and(|n| n <= bound), "Invalid number")
}
