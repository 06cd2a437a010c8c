//! Rule registry
//!
//! Maps rule names to filter and validator handlers. The registry starts
//! with the built-in capability set and can be extended at runtime with
//! [`add_filter`] and [`add_validator`].
//!
//! The process-wide registry is copy-on-write: builders take an `Arc`
//! snapshot when they are created, so a registration only affects builders
//! created after it. Register custom rules before defining the pipelines
//! that use them.

use super::validators::{Check, RuleFailure};
use super::{filters, validators};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A named filter: current value plus captured arguments to the new value
pub type FilterHandler = Arc<dyn Fn(Value, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// A named validator: value plus captured arguments to a check outcome
pub type ValidatorHandler = Arc<dyn Fn(&Value, &[Value]) -> Check + Send + Sync>;

/// A registered validator and the position of its custom message argument
#[derive(Clone)]
pub struct ValidatorRule {
    pub handler: ValidatorHandler,
    /// Index of the call argument holding the custom failure message;
    /// arguments before it are the rule's parameters
    pub message_index: usize,
}

/// Message argument position of a built-in validator
///
/// `equals`, `contains`, `not_contains`, `min` and `max` take one parameter
/// before the message; `regex`, `not_regex` and `len` take two; `required`
/// takes its placeholder first. Every other rule takes the message first.
pub fn message_index(rule: &str) -> usize {
    match rule {
        "equals" | "contains" | "not_contains" | "min" | "max" | "required" => 1,
        "regex" | "not_regex" | "len" => 2,
        _ => 0,
    }
}

/// Name to handler tables for filters and validators
#[derive(Clone, Default)]
pub struct RuleRegistry {
    filters: HashMap<String, FilterHandler>,
    validators: HashMap<String, ValidatorRule>,
}

impl RuleRegistry {
    /// Empty registry, without the built-in rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in capability set
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        let builtin_filters: [(&str, fn(Value, &[Value]) -> anyhow::Result<Value>); 13] = [
            ("trim", filters::trim),
            ("ltrim", filters::ltrim),
            ("rtrim", filters::rtrim),
            ("if_null", filters::if_null),
            ("to_float", filters::to_float),
            ("to_int", filters::to_int),
            ("to_boolean", filters::to_boolean),
            ("to_boolean_strict", filters::to_boolean_strict),
            ("to_lower", filters::to_lower),
            ("to_upper", filters::to_upper),
            ("truncate", filters::truncate),
            ("escape", filters::escape),
            ("entity_decode", filters::entity_decode),
        ];
        for (name, handler) in builtin_filters {
            registry.filters.insert(name.to_string(), Arc::new(handler));
        }

        let builtin_validators: [(&str, fn(&Value, &[Value]) -> Check); 24] = [
            ("required", validators::required),
            ("is_email", validators::is_email),
            ("is_url", validators::is_url),
            ("is_ip", validators::is_ip),
            ("is_alpha", validators::is_alpha),
            ("is_alphanumeric", validators::is_alphanumeric),
            ("is_numeric", validators::is_numeric),
            ("is_int", validators::is_int),
            ("is_decimal", validators::is_decimal),
            ("is_lowercase", validators::is_lowercase),
            ("is_uppercase", validators::is_uppercase),
            ("not_null", validators::not_null),
            ("is_null", validators::is_null),
            ("not_empty", validators::not_empty),
            ("equals", validators::equals),
            ("contains", validators::contains),
            ("not_contains", validators::not_contains),
            ("regex", validators::regex),
            ("not_regex", validators::not_regex),
            ("len", validators::len),
            ("is_uuid", validators::is_uuid),
            ("is_date", validators::is_date),
            ("min", validators::min),
            ("max", validators::max),
        ];
        for (name, handler) in builtin_validators {
            registry.validators.insert(
                name.to_string(),
                ValidatorRule {
                    handler: Arc::new(handler),
                    message_index: message_index(name),
                },
            );
        }
        registry
    }

    /// Register (or replace) a filter
    pub fn register_filter(&mut self, name: impl Into<String>, handler: FilterHandler) {
        let name = name.into();
        if self.filters.insert(name.clone(), handler).is_some() {
            tracing::warn!(rule = %name, "Filter rule replaced");
        }
    }

    /// Register (or replace) a validator
    pub fn register_validator(&mut self, name: impl Into<String>, rule: ValidatorRule) {
        let name = name.into();
        if self.validators.insert(name.clone(), rule).is_some() {
            tracing::warn!(rule = %name, "Validator rule replaced");
        }
    }

    /// Look up a filter by name
    pub fn filter(&self, name: &str) -> Option<&FilterHandler> {
        self.filters.get(name)
    }

    /// Look up a validator by name
    pub fn validator(&self, name: &str) -> Option<&ValidatorRule> {
        self.validators.get(name)
    }

    /// Registered filter names, sorted
    pub fn filter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered validator names, sorted
    pub fn validator_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn global() -> &'static RwLock<Arc<RuleRegistry>> {
    static REGISTRY: OnceLock<RwLock<Arc<RuleRegistry>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Arc::new(RuleRegistry::with_builtins())))
}

/// Snapshot of the process-wide registry
pub fn registry() -> Arc<RuleRegistry> {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn update(f: impl FnOnce(&mut RuleRegistry)) {
    let mut guard = global().write().unwrap_or_else(PoisonError::into_inner);
    let mut next = RuleRegistry::clone(&guard);
    f(&mut next);
    *guard = Arc::new(next);
}

/// Register a filter in the process-wide registry
///
/// # Example
///
/// ```rust,ignore
/// add_filter("capitalize", |value: Value, _: &[Value]| {
///     Ok(match value.as_str() {
///         Some(s) => Value::String(s.to_uppercase()),
///         None => value,
///     })
/// });
/// let routine = filter("name").rule("capitalize", vec![])?;
/// ```
pub fn add_filter<F>(name: &str, handler: F)
where
    F: Fn(Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    tracing::debug!(rule = %name, "Registering filter rule");
    update(|registry| registry.register_filter(name, Arc::new(handler)));
}

/// Register a validator in the process-wide registry
///
/// `message_index` is the position of the custom message among the call
/// arguments. The handler's `Err` text is used when no message is given.
pub fn add_validator<F>(name: &str, message_index: usize, handler: F)
where
    F: Fn(&Value, &[Value]) -> Result<(), String> + Send + Sync + 'static,
{
    tracing::debug!(rule = %name, message_index, "Registering validator rule");
    let handler: ValidatorHandler =
        Arc::new(move |value: &Value, args: &[Value]| handler(value, args).map_err(RuleFailure::Rejected));
    update(|registry| {
        registry.register_validator(
            name,
            ValidatorRule {
                handler,
                message_index,
            },
        )
    });
}
