//! Axum integration
//!
//! Attach a [`FormPipeline`](crate::pipeline::FormPipeline) to a route with
//! `axum::middleware::from_fn_with_state(pipeline, form_middleware)` and
//! read the outcome in the handler through the
//! [`FormContext`](crate::pipeline::FormContext) extractor.

pub mod extractor;
pub mod middleware;

pub use middleware::{apply_to_request, form_middleware};
