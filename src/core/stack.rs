//! Per-field operation stacks
//!
//! An [`OperationStack`] is the ordered list of operations bound to a single
//! field. Filter stacks fold their operations over the field value and write
//! the result back into the record; validator stacks run every operation
//! against the untouched value and collect the failure messages.
//!
//! Stacks are built once when a pipeline is defined and shared by every
//! request that runs through it, so running a stack never mutates it.

use super::error::FormError;
use super::field::Record;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A filter operation: takes the current field value, returns the new one
pub type FilterOp = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

/// A validator operation: passes, or fails with a rendered message
pub type ValidatorOp = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Ordered operations bound to one field
pub struct OperationStack<Op> {
    field: String,
    ops: Vec<Op>,
}

impl<Op> OperationStack<Op> {
    /// Create an empty stack for `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ops: Vec::new(),
        }
    }

    /// Append an operation
    pub fn extend(&mut self, op: Op) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Name of the field this stack operates on
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<Op> fmt::Debug for OperationStack<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationStack")
            .field("field", &self.field)
            .field("ops", &self.ops.len())
            .finish()
    }
}

impl OperationStack<FilterOp> {
    /// Fold every operation over the field value, writing the result back
    /// after each step
    ///
    /// An undefined field is presented as `null` and stays undefined while
    /// the operations keep returning `null`. When an operation fails, the
    /// record keeps the value produced by the last successful step.
    pub fn run(&self, record: &mut Record) -> Result<(), FormError> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let mut defined = record.contains_key(&self.field);
        let mut value = record.get(&self.field).cloned().unwrap_or(Value::Null);

        for op in &self.ops {
            value = op(value).map_err(|e| FormError::Filter {
                field: self.field.clone(),
                message: e.to_string(),
            })?;
            if defined || !value.is_null() {
                record.insert(self.field.clone(), value.clone());
                defined = true;
            }
        }
        Ok(())
    }
}

impl OperationStack<ValidatorOp> {
    /// Run every operation against the unmodified field value
    ///
    /// Returns the failure messages in declaration order, or `None` when
    /// every operation passed.
    pub fn run(&self, record: &Record) -> Option<Vec<String>> {
        let value = record.get(&self.field).unwrap_or(&Value::Null);

        let errors: Vec<String> = self
            .ops
            .iter()
            .filter_map(|op| op(value).err())
            .collect();

        if errors.is_empty() { None } else { Some(errors) }
    }
}

/// Outcome of running one routine against a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutineOutcome {
    /// Failure messages, absent when the routine recorded none
    pub errors: Option<Vec<String>>,
}

/// Anything a pipeline can run against a record
///
/// Implemented by the filter and validator builders; custom routines can
/// implement it to take part in a pipeline alongside them.
pub trait FieldRoutine: Send + Sync {
    /// Name of the field the routine is bound to
    fn field(&self) -> &str;

    /// Run against the record, mutating it if the routine filters
    fn run(&self, record: &mut Record) -> Result<RoutineOutcome, FormError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn append(suffix: &'static str) -> FilterOp {
        Arc::new(move |value: Value| -> anyhow::Result<Value> {
            Ok(Value::String(format!(
                "{}{}",
                value.as_str().unwrap_or_default(),
                suffix
            )))
        })
    }

    fn fail_with(message: &'static str) -> ValidatorOp {
        Arc::new(move |_: &Value| -> Result<(), String> {
            Err(message.to_string())
        })
    }

    // === filter stack ===

    #[test]
    fn test_filter_stack_composes_left_to_right() {
        let mut stack: OperationStack<FilterOp> = OperationStack::new("name");
        stack.extend(append("-f1")).extend(append("-f2"));

        let mut data = record(json!({ "name": "v" }));
        stack.run(&mut data).expect("should not fail");
        assert_eq!(data["name"], json!("v-f1-f2"));
    }

    #[test]
    fn test_filter_stack_error_propagates() {
        let mut stack: OperationStack<FilterOp> = OperationStack::new("age");
        stack.extend(Arc::new(|_: Value| -> anyhow::Result<Value> {
            Err(anyhow::anyhow!("not a number"))
        }));

        let mut data = record(json!({ "age": "x" }));
        let err = stack.run(&mut data).unwrap_err();
        assert!(matches!(err, FormError::Filter { ref field, .. } if field == "age"));
    }

    #[test]
    fn test_filter_stack_error_keeps_last_good_value() {
        let mut stack: OperationStack<FilterOp> = OperationStack::new("name");
        stack
            .extend(append("-f1"))
            .extend(Arc::new(|_: Value| -> anyhow::Result<Value> {
                Err(anyhow::anyhow!("boom"))
            }))
            .extend(append("-f3"));

        let mut data = record(json!({ "name": "v" }));
        assert!(stack.run(&mut data).is_err());
        assert_eq!(data["name"], json!("v-f1"));
    }

    #[test]
    fn test_filter_stack_first_step_error_keeps_input() {
        let mut stack: OperationStack<FilterOp> = OperationStack::new("name");
        stack.extend(Arc::new(|_: Value| -> anyhow::Result<Value> {
            Err(anyhow::anyhow!("boom"))
        }));

        let mut data = record(json!({ "name": "  bob  " }));
        assert!(stack.run(&mut data).is_err());
        assert_eq!(data["name"], json!("  bob  "));

        let mut empty = record(json!({}));
        assert!(stack.run(&mut empty).is_err());
        assert!(!empty.contains_key("name"));
    }

    #[test]
    fn test_filter_stack_undefined_null_stays_undefined() {
        let mut stack: OperationStack<FilterOp> = OperationStack::new("missing");
        stack.extend(Arc::new(|v: Value| -> anyhow::Result<Value> { Ok(v) }));

        let mut data = record(json!({}));
        stack.run(&mut data).expect("should not fail");
        assert!(!data.contains_key("missing"));
    }

    #[test]
    fn test_filter_stack_undefined_can_be_filled() {
        let mut stack: OperationStack<FilterOp> = OperationStack::new("missing");
        stack.extend(append("default"));

        let mut data = record(json!({}));
        stack.run(&mut data).expect("should not fail");
        assert_eq!(data["missing"], json!("default"));
    }

    #[test]
    fn test_filter_stack_defined_null_is_kept() {
        let stack: OperationStack<FilterOp> = {
            let mut s: OperationStack<FilterOp> = OperationStack::new("note");
            s.extend(Arc::new(|v: Value| -> anyhow::Result<Value> { Ok(v) }));
            s
        };

        let mut data = record(json!({ "note": null }));
        stack.run(&mut data).expect("should not fail");
        assert_eq!(data.get("note"), Some(&Value::Null));
    }

    // === validator stack ===

    #[test]
    fn test_validator_stack_all_pass_returns_none() {
        let mut stack: OperationStack<ValidatorOp> = OperationStack::new("name");
        stack.extend(Arc::new(|_: &Value| -> Result<(), String> { Ok(()) }));

        let data = record(json!({ "name": "bob" }));
        assert_eq!(stack.run(&data), None);
    }

    #[test]
    fn test_validator_stack_preserves_declaration_order() {
        let mut stack: OperationStack<ValidatorOp> = OperationStack::new("name");
        stack
            .extend(fail_with("first"))
            .extend(Arc::new(|_: &Value| -> Result<(), String> { Ok(()) }))
            .extend(fail_with("second"));

        let data = record(json!({ "name": "bob" }));
        assert_eq!(
            stack.run(&data),
            Some(vec!["first".to_string(), "second".to_string()])
        );
    }

    #[test]
    fn test_validator_stack_sees_pristine_value() {
        let mut stack: OperationStack<ValidatorOp> = OperationStack::new("name");
        stack
            .extend(fail_with("always"))
            .extend(Arc::new(|v: &Value| -> Result<(), String> {
                if v == &json!("bob") {
                    Ok(())
                } else {
                    Err("changed".to_string())
                }
            }));

        let data = record(json!({ "name": "bob" }));
        assert_eq!(stack.run(&data), Some(vec!["always".to_string()]));
    }

    #[test]
    fn test_validator_stack_missing_field_reads_null() {
        let mut stack: OperationStack<ValidatorOp> = OperationStack::new("missing");
        stack.extend(Arc::new(|v: &Value| -> Result<(), String> {
            if v.is_null() {
                Err("null".to_string())
            } else {
                Ok(())
            }
        }));

        assert_eq!(stack.run(&Record::new()), Some(vec!["null".to_string()]));
    }

    #[test]
    fn test_stack_len_and_field() {
        let mut stack: OperationStack<ValidatorOp> = OperationStack::new("email");
        assert!(stack.is_empty());
        stack.extend(fail_with("x"));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.field(), "email");
    }
}
