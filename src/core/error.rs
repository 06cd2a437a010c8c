//! Typed error handling for form pipelines
//!
//! Validation failures are never errors at this level: they are rendered to
//! strings and collected in the request's [`FormContext`](crate::pipeline::FormContext).
//! [`FormError`] covers the failures that abort a pipeline run or a chain
//! definition:
//!
//! - [`FormError::UnknownRule`]: a chain referenced a rule name nobody registered
//! - [`FormError::InvalidArgument`]: a rule was bound with arguments it cannot use
//! - [`FormError::Filter`]: a filter operation failed while running
//! - [`FormError::Body`]: the axum adapter could not decode the request body
//! - [`FormError::BodyTooLarge`]: the request body exceeded the route's body limit
//! - [`FormError::Config`]: configuration could not be loaded
//!
//! # Example
//!
//! ```rust,ignore
//! match filter("age").rule("to_roman", vec![]) {
//!     Ok(builder) => { /* ... */ }
//!     Err(FormError::UnknownRule { kind, name }) => {
//!         eprintln!("no {} named {}", kind, name);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Which capability set a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Filter,
    Validator,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Filter => write!(f, "filter"),
            RuleKind::Validator => write!(f, "validator"),
        }
    }
}

/// The main error type for form pipelines
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// No rule with this name is registered
    #[error("Unknown {kind} rule '{name}'")]
    UnknownRule { kind: RuleKind, name: String },

    /// Rule arguments are missing or have the wrong shape
    #[error("Invalid argument for rule '{rule}': {message}")]
    InvalidArgument { rule: String, message: String },

    /// A filter operation failed while transforming a field
    #[error("Filter failed on field '{field}': {message}")]
    Filter { field: String, message: String },

    /// The request body could not be turned into a record
    #[error("Invalid form body: {message}")]
    Body { message: String },

    /// The request body exceeded the route's body limit
    #[error("Form body too large: {message}")]
    BodyTooLarge { message: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl FormError {
    /// Shorthand for an argument error on `rule`
    pub fn invalid_argument(rule: &str, message: impl Into<String>) -> Self {
        FormError::InvalidArgument {
            rule: rule.to_string(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            FormError::UnknownRule { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            FormError::InvalidArgument { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            FormError::Filter { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            FormError::Body { .. } => StatusCode::BAD_REQUEST,
            FormError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FormError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            FormError::UnknownRule { .. } => "UNKNOWN_RULE",
            FormError::InvalidArgument { .. } => "INVALID_RULE_ARGUMENT",
            FormError::Filter { .. } => "FILTER_FAILED",
            FormError::Body { .. } => "INVALID_FORM_BODY",
            FormError::BodyTooLarge { .. } => "FORM_BODY_TOO_LARGE",
            FormError::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            FormError::UnknownRule { kind, name } => Some(serde_json::json!({
                "kind": kind,
                "rule": name
            })),
            FormError::Filter { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<serde_yaml::Error> for FormError {
    fn from(err: serde_yaml::Error) -> Self {
        FormError::Config {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for FormError {
    fn from(err: std::io::Error) -> Self {
        FormError::Config {
            message: err.to_string(),
        }
    }
}
