//! # Form Pipeline
//!
//! Declarative filtering and validation of submitted form data for axum
//! applications.
//!
//! ## Features
//!
//! - **Chainable Builders**: `filter("field").trim().to_lower()` and
//!   `validate("field").required("...")` chains, one per field
//! - **Built-in Rules**: 13 filters and 24 validators, with default messages
//! - **Custom Rules**: Register named filters and validators at runtime
//! - **Non-blocking Validation**: Failures are collected, the handler decides
//! - **Axum Middleware**: JSON and URL-encoded bodies, plus a `FormContext` extractor
//! - **Configuration-Based**: Options loadable from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use form_pipeline::prelude::*;
//!
//! let register = form![
//!     filter("username").trim().to_lower(),
//!     validate("username")
//!         .required("Username required")
//!         .is_alphanumeric("Letters and numbers only"),
//!     filter("password").trim(),
//!     validate("password").len(8, None, "Password too short"),
//! ];
//!
//! let app = Router::new().route(
//!     "/register",
//!     post(register_user).layer(from_fn_with_state(register, form_middleware)),
//! );
//!
//! async fn register_user(form: FormContext, Json(body): Json<Value>) -> Response {
//!     match form.errors() {
//!         Some(errors) => (StatusCode::UNPROCESSABLE_ENTITY, Json(errors.to_vec())).into_response(),
//!         None => Json(body).into_response(),
//!     }
//! }
//! ```

pub mod config;
pub mod core;
pub mod pipeline;
pub mod server;

pub use crate::config::{FormConfig, configure, current_config};
pub use crate::core::error::FormError;
pub use crate::core::validation::{add_filter, add_validator};
pub use crate::pipeline::{FormContext, FormPipeline, FormRequest, filter, form, validate, validator};

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{ErrorResponse, FormError, RuleKind},
        field::Record,
        stack::{FieldRoutine, OperationStack, RoutineOutcome},
        validation::{RuleRegistry, add_filter, add_validator},
    };

    // === Pipeline ===
    pub use crate::pipeline::{
        FilterBuilder, FormContext, FormPipeline, FormRequest, ValidatorBuilder, boxed, filter,
        validate, validator,
    };

    // === Macros ===
    // Brings in both the `form!` macro and the `form` function
    pub use crate::form;

    // === Config ===
    pub use crate::config::{FormConfig, configure, current_config};

    // === Server ===
    pub use crate::server::form_middleware;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{
        Json, Router,
        http::StatusCode,
        middleware::from_fn_with_state,
        response::{IntoResponse, Response},
        routing::{get, post},
    };
}
