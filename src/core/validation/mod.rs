//! Filter and validator capability sets
//!
//! This module holds the named rules that chain builders bind to: the
//! built-in filters and validators, and the registry that maps rule names
//! to handlers and lets applications add their own.

pub mod args;
pub mod filters;
pub mod registry;
pub mod validators;

pub use registry::{
    FilterHandler, RuleRegistry, ValidatorHandler, ValidatorRule, add_filter, add_validator,
    message_index, registry,
};
pub use validators::{Check, REQUIRED_MESSAGE, RuleFailure};
