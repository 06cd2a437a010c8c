//! Core module containing the record model, operation stacks and rules

pub mod error;
pub mod field;
pub mod stack;
pub mod validation;

pub use error::{ErrorResponse, FormError, RuleKind};
pub use field::{Record, loose_eq};
pub use stack::{FieldRoutine, FilterOp, OperationStack, RoutineOutcome, ValidatorOp};
