//! Chainable filter definitions
//!
//! ```rust,ignore
//! let username = filter("username").trim().to_lower().truncate(32);
//! let age = filter("age").rule("to_int", vec![])?;
//! ```

use crate::core::error::{FormError, RuleKind};
use crate::core::field::Record;
use crate::core::stack::{FieldRoutine, FilterOp, OperationStack, RoutineOutcome};
use crate::core::validation::filters;
use crate::core::validation::{FilterHandler, RuleRegistry, registry};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type BuiltinFilter = fn(Value, &[Value]) -> anyhow::Result<Value>;

/// Builds the filter stack of one field
pub struct FilterBuilder {
    stack: OperationStack<FilterOp>,
    rules: Arc<RuleRegistry>,
}

impl FilterBuilder {
    /// Start a filter chain bound to the process-wide rule registry
    pub fn new(field: impl Into<String>) -> Self {
        Self::with_registry(field, registry())
    }

    /// Start a filter chain bound to a specific registry
    pub fn with_registry(field: impl Into<String>, rules: Arc<RuleRegistry>) -> Self {
        Self {
            stack: OperationStack::new(field),
            rules,
        }
    }

    /// Append a raw operation
    pub fn extend(mut self, op: FilterOp) -> Self {
        self.stack.extend(op);
        self
    }

    /// Append a caller-supplied transform
    pub fn custom<F>(self, transform: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.extend(Arc::new(transform))
    }

    /// Append a registered filter by name
    ///
    /// Fails when no filter with that name is registered.
    pub fn rule(self, name: &str, args: Vec<Value>) -> Result<Self, FormError> {
        let handler = self
            .rules
            .filter(name)
            .cloned()
            .ok_or_else(|| FormError::UnknownRule {
                kind: RuleKind::Filter,
                name: name.to_string(),
            })?;
        Ok(self.bind(handler, args))
    }

    fn bind(self, handler: FilterHandler, args: Vec<Value>) -> Self {
        self.extend(Arc::new(move |value: Value| handler(value, &args)))
    }

    fn builtin(self, name: &str, fallback: BuiltinFilter, args: Vec<Value>) -> Self {
        let handler: FilterHandler = match self.rules.filter(name) {
            Some(handler) => handler.clone(),
            None => Arc::new(fallback),
        };
        self.bind(handler, args)
    }

    pub fn trim(self) -> Self {
        self.builtin("trim", filters::trim, vec![])
    }

    /// Strip the given characters instead of whitespace
    pub fn trim_chars(self, chars: &str) -> Self {
        self.builtin("trim", filters::trim, vec![Value::from(chars)])
    }

    pub fn ltrim(self) -> Self {
        self.builtin("ltrim", filters::ltrim, vec![])
    }

    pub fn rtrim(self) -> Self {
        self.builtin("rtrim", filters::rtrim, vec![])
    }

    /// Replace a null, undefined or empty value
    pub fn if_null(self, replacement: impl Into<Value>) -> Self {
        self.builtin("if_null", filters::if_null, vec![replacement.into()])
    }

    pub fn to_float(self) -> Self {
        self.builtin("to_float", filters::to_float, vec![])
    }

    pub fn to_int(self) -> Self {
        self.builtin("to_int", filters::to_int, vec![])
    }

    pub fn to_boolean(self) -> Self {
        self.builtin("to_boolean", filters::to_boolean, vec![])
    }

    pub fn to_boolean_strict(self) -> Self {
        self.builtin("to_boolean_strict", filters::to_boolean_strict, vec![])
    }

    pub fn to_lower(self) -> Self {
        self.builtin("to_lower", filters::to_lower, vec![])
    }

    pub fn to_upper(self) -> Self {
        self.builtin("to_upper", filters::to_upper, vec![])
    }

    /// Keep at most `length` characters
    pub fn truncate(self, length: i64) -> Self {
        self.builtin("truncate", filters::truncate, vec![Value::from(length)])
    }

    pub fn escape(self) -> Self {
        self.builtin("escape", filters::escape, vec![])
    }

    pub fn entity_decode(self) -> Self {
        self.builtin("entity_decode", filters::entity_decode, vec![])
    }

    /// Name of the filtered field
    pub fn field(&self) -> &str {
        self.stack.field()
    }

    /// The operations defined so far
    pub fn stack(&self) -> &OperationStack<FilterOp> {
        &self.stack
    }
}

impl fmt::Debug for FilterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("field", &self.stack.field())
            .field("ops", &self.stack.len())
            .finish()
    }
}

impl FieldRoutine for FilterBuilder {
    fn field(&self) -> &str {
        self.stack.field()
    }

    fn run(&self, record: &mut Record) -> Result<RoutineOutcome, FormError> {
        self.stack.run(record)?;
        Ok(RoutineOutcome::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(builder: &FilterBuilder, data: Value) -> Record {
        let mut record = data.as_object().cloned().unwrap_or_default();
        FieldRoutine::run(builder, &mut record).expect("should not fail");
        record
    }

    #[test]
    fn test_chain_applies_in_order() {
        let builder = FilterBuilder::new("name").trim().to_upper().truncate(3);
        let record = run(&builder, json!({ "name": "  alice  " }));
        assert_eq!(record["name"], json!("ALI"));
    }

    #[test]
    fn test_truncate_scenarios() {
        let builder = FilterBuilder::new("code").truncate(5);
        assert_eq!(run(&builder, json!({ "code": "abcdefgh" }))["code"], json!("abcde"));
        assert_eq!(run(&builder, json!({ "code": "abc" }))["code"], json!("abc"));
    }

    #[test]
    fn test_custom_transform() {
        let builder = FilterBuilder::new("tags").custom(|value| {
            Ok(match value.as_str() {
                Some(s) => Value::from(s.split(',').map(str::trim).collect::<Vec<_>>()),
                None => value,
            })
        });
        let record = run(&builder, json!({ "tags": "a, b ,c" }));
        assert_eq!(record["tags"], json!(["a", "b", "c"]));
    }

    #[test]
    fn test_rule_by_name() {
        let builder = FilterBuilder::new("age")
            .rule("trim", vec![])
            .and_then(|b| b.rule("to_int", vec![]))
            .expect("rules exist");
        let record = run(&builder, json!({ "age": " 42 " }));
        assert_eq!(record["age"], json!(42));
    }

    #[test]
    fn test_unknown_rule_is_rejected_at_build_time() {
        let err = FilterBuilder::new("age").rule("to_roman", vec![]).err().unwrap();
        assert!(matches!(
            err,
            FormError::UnknownRule { kind: RuleKind::Filter, ref name } if name == "to_roman"
        ));
    }

    #[test]
    fn test_runtime_error_propagates() {
        let builder = FilterBuilder::new("note").rule("if_null", vec![]).unwrap();
        let mut record = Record::new();
        let err = FieldRoutine::run(&builder, &mut record).unwrap_err();
        assert!(matches!(err, FormError::Filter { ref field, .. } if field == "note"));
    }

    #[test]
    fn test_registry_override_applies_to_typed_method() {
        let mut rules = RuleRegistry::with_builtins();
        rules.register_filter(
            "trim",
            Arc::new(|_: Value, _: &[Value]| -> anyhow::Result<Value> { Ok(json!("overridden")) }),
        );
        let builder = FilterBuilder::with_registry("name", Arc::new(rules)).trim();
        assert_eq!(run(&builder, json!({ "name": " x " }))["name"], json!("overridden"));
    }

    #[test]
    fn test_empty_registry_falls_back_to_builtin() {
        let builder = FilterBuilder::with_registry("name", Arc::new(RuleRegistry::new())).trim();
        assert_eq!(run(&builder, json!({ "name": " x " }))["name"], json!("x"));
    }

    #[test]
    fn test_builder_is_reusable_across_records() {
        let builder = FilterBuilder::new("name").trim();
        assert_eq!(run(&builder, json!({ "name": " a " }))["name"], json!("a"));
        assert_eq!(run(&builder, json!({ "name": " b " }))["name"], json!("b"));
        assert_eq!(builder.stack().len(), 1);
    }

    #[test]
    fn test_builder_debug_names_field() {
        let builder = FilterBuilder::new("name").trim().to_lower();
        assert_eq!(format!("{builder:?}"), r#"FilterBuilder { field: "name", ops: 2 }"#);
    }
}
