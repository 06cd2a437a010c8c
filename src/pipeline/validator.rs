//! Chainable validator definitions
//!
//! Every rule method takes its custom failure message as the last argument,
//! after the rule's own parameters:
//!
//! ```rust,ignore
//! validate("age").equals(18, "Must be 18");
//! validate("code").regex("^[A-Z]{3}$", "", "Three capital letters");
//! validate("name").len(2, Some(40), "Between 2 and 40 characters");
//! ```
//!
//! Rules looked up by name follow the same convention: the argument at the
//! rule's message index is the message, the ones before it are parameters.
//! Without a message the rule's default text is recorded.

use crate::core::error::{FormError, RuleKind};
use crate::core::field::Record;
use crate::core::stack::{FieldRoutine, OperationStack, RoutineOutcome, ValidatorOp};
use crate::core::validation::args;
use crate::core::validation::validators::{self, Check};
use crate::core::validation::{RuleRegistry, ValidatorRule, message_index, registry};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type BuiltinValidator = fn(&Value, &[Value]) -> Check;

/// Defines rule methods whose only argument is the failure message
macro_rules! message_only_rules {
    ($( $(#[$doc:meta])* $name:ident ),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(self, message: &str) -> Self {
                self.builtin(stringify!($name), validators::$name, vec![Value::from(message)])
            }
        )*
    };
}

/// Compile the pattern of a `regex`/`not_regex` rule ahead of any request
fn precompile(rule: &str, args: &[Value]) -> Result<(), FormError> {
    if !matches!(rule, "regex" | "not_regex") {
        return Ok(());
    }
    validators::build_regex(rule, args)
        .map(|_| ())
        .map_err(|failure| FormError::invalid_argument(rule, failure.render(None)))
}

/// Builds the validator stack of one field
pub struct ValidatorBuilder {
    stack: OperationStack<ValidatorOp>,
    rules: Arc<RuleRegistry>,
}

impl ValidatorBuilder {
    /// Start a validator chain bound to the process-wide rule registry
    pub fn new(field: impl Into<String>) -> Self {
        Self::with_registry(field, registry())
    }

    /// Start a validator chain bound to a specific registry
    pub fn with_registry(field: impl Into<String>, rules: Arc<RuleRegistry>) -> Self {
        Self {
            stack: OperationStack::new(field),
            rules,
        }
    }

    /// Append a raw operation
    pub fn extend(mut self, op: ValidatorOp) -> Self {
        self.stack.extend(op);
        self
    }

    /// Append a caller-supplied check; its `Err` text is recorded as is
    pub fn custom<F>(self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.extend(Arc::new(check))
    }

    /// Append a registered validator by name
    ///
    /// `args` are the rule parameters followed by an optional custom message.
    /// Fails when no validator with that name is registered, or when a
    /// `regex`/`not_regex` pattern does not compile.
    pub fn rule(self, name: &str, args: Vec<Value>) -> Result<Self, FormError> {
        let rule = self
            .rules
            .validator(name)
            .cloned()
            .ok_or_else(|| FormError::UnknownRule {
                kind: RuleKind::Validator,
                name: name.to_string(),
            })?;
        precompile(name, &args)?;
        Ok(self.bind(rule, args))
    }

    fn bind(self, rule: ValidatorRule, mut params: Vec<Value>) -> Self {
        let message = args::optional_text(&params, rule.message_index);
        params.truncate(rule.message_index);
        let handler = rule.handler;

        self.extend(Arc::new(move |value: &Value| {
            handler(value, &params).map_err(|failure| failure.render(message.as_deref()))
        }))
    }

    fn warn_on_bad_pattern(&self, rule: &str, pattern: &str, flags: &str) {
        if let Err(e) = precompile(rule, &[Value::from(pattern), Value::from(flags)]) {
            tracing::warn!(field = %self.field(), error = %e, "Validator pattern does not compile");
        }
    }

    fn builtin(self, name: &str, fallback: BuiltinValidator, args: Vec<Value>) -> Self {
        let rule = match self.rules.validator(name) {
            Some(rule) => rule.clone(),
            None => ValidatorRule {
                handler: Arc::new(fallback),
                message_index: message_index(name),
            },
        };
        self.bind(rule, args)
    }

    /// Fail when the value is undefined, null or empty
    pub fn required(self, message: &str) -> Self {
        self.builtin(
            "required",
            validators::required,
            vec![Value::Null, Value::from(message)],
        )
    }

    /// Fail when the value is undefined, null, empty or loosely equal to
    /// `placeholder`; without a message the default text is recorded
    pub fn required_with(self, placeholder: impl Into<Value>, message: Option<&str>) -> Self {
        self.builtin(
            "required",
            validators::required,
            vec![placeholder.into(), message.map(Value::from).unwrap_or(Value::Null)],
        )
    }

    message_only_rules! {
        is_email,
        is_url,
        is_ip,
        is_alpha,
        is_alphanumeric,
        is_numeric,
        is_int,
        is_decimal,
        is_lowercase,
        is_uppercase,
        not_null,
        is_null,
        /// Fail on whitespace-only values
        not_empty,
        is_uuid,
        /// Accepts RFC 3339 timestamps and `YYYY-MM-DD` dates
        is_date,
    }

    /// Fail unless the value loosely equals `expected`
    pub fn equals(self, expected: impl Into<Value>, message: &str) -> Self {
        self.builtin(
            "equals",
            validators::equals,
            vec![expected.into(), Value::from(message)],
        )
    }

    pub fn contains(self, needle: &str, message: &str) -> Self {
        self.builtin(
            "contains",
            validators::contains,
            vec![Value::from(needle), Value::from(message)],
        )
    }

    pub fn not_contains(self, needle: &str, message: &str) -> Self {
        self.builtin(
            "not_contains",
            validators::not_contains,
            vec![Value::from(needle), Value::from(message)],
        )
    }

    /// Fail unless the text matches `pattern`; `flags` is any of `imsx`
    ///
    /// The pattern is compiled here. A pattern that does not compile is
    /// logged and every run records the compile error for the field.
    pub fn regex(self, pattern: &str, flags: &str, message: &str) -> Self {
        self.warn_on_bad_pattern("regex", pattern, flags);
        self.builtin(
            "regex",
            validators::regex,
            vec![Value::from(pattern), Value::from(flags), Value::from(message)],
        )
    }

    pub fn not_regex(self, pattern: &str, flags: &str, message: &str) -> Self {
        self.warn_on_bad_pattern("not_regex", pattern, flags);
        self.builtin(
            "not_regex",
            validators::not_regex,
            vec![Value::from(pattern), Value::from(flags), Value::from(message)],
        )
    }

    /// Fail unless the character count is within `min..=max`
    pub fn len(self, min: usize, max: Option<usize>, message: &str) -> Self {
        self.builtin(
            "len",
            validators::len,
            vec![
                Value::from(min),
                max.map(Value::from).unwrap_or(Value::Null),
                Value::from(message),
            ],
        )
    }

    pub fn min(self, bound: f64, message: &str) -> Self {
        self.builtin(
            "min",
            validators::min,
            vec![Value::from(bound), Value::from(message)],
        )
    }

    pub fn max(self, bound: f64, message: &str) -> Self {
        self.builtin(
            "max",
            validators::max,
            vec![Value::from(bound), Value::from(message)],
        )
    }

    /// Name of the validated field
    pub fn field(&self) -> &str {
        self.stack.field()
    }

    /// The operations defined so far
    pub fn stack(&self) -> &OperationStack<ValidatorOp> {
        &self.stack
    }
}

impl fmt::Debug for ValidatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorBuilder")
            .field("field", &self.stack.field())
            .field("ops", &self.stack.len())
            .finish()
    }
}

impl FieldRoutine for ValidatorBuilder {
    fn field(&self) -> &str {
        self.stack.field()
    }

    fn run(&self, record: &mut Record) -> Result<RoutineOutcome, FormError> {
        Ok(RoutineOutcome {
            errors: self.stack.run(record),
        })
    }
}
