//! Form pipelines
//!
//! A [`FormPipeline`] is the ordered, immutable list of filter and validator
//! routines attached to a route. Running it filters the record in place and
//! appends every validation failure to the request's [`FormContext`]. The
//! pipeline never rejects a request for failing validation: the outcome is
//! left for the handler to inspect.
//!
//! # Example
//!
//! ```rust,ignore
//! use form_pipeline::prelude::*;
//!
//! let pipeline = form![
//!     filter("username").trim(),
//!     validate("username").required("Username required"),
//! ];
//!
//! let mut request = FormRequest::new(record);
//! pipeline.handle(&mut request, |request| {
//!     if !request.form.is_valid() {
//!         // re-render the form with request.form.errors()
//!     }
//! })?;
//! ```

pub mod filter;
pub mod macros;
pub mod validator;

pub use self::filter::FilterBuilder;
pub use self::validator::ValidatorBuilder;

use crate::config::current_config;
use crate::core::error::FormError;
use crate::core::field::Record;
use crate::core::stack::FieldRoutine;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Start a filter chain for `field`
pub fn filter(field: impl Into<String>) -> FilterBuilder {
    FilterBuilder::new(field)
}

/// Start a validator chain for `field`
pub fn validate(field: impl Into<String>) -> ValidatorBuilder {
    ValidatorBuilder::new(field)
}

/// Alias of [`validate`]
pub fn validator(field: impl Into<String>) -> ValidatorBuilder {
    ValidatorBuilder::new(field)
}

/// Compose routines into a pipeline, run in the given order
pub fn form(routines: Vec<Box<dyn FieldRoutine>>) -> FormPipeline {
    FormPipeline::new(routines)
}

/// Box a routine for [`form`]
pub fn boxed(routine: impl FieldRoutine + 'static) -> Box<dyn FieldRoutine> {
    Box::new(routine)
}

/// Outcome of the form pipelines a request went through
///
/// The error list is absent until the first failure is recorded, so a
/// request that passed every validator is distinguishable from one that
/// never ran any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormContext {
    errors: Option<Vec<String>>,
    #[serde(skip)]
    fields: Vec<String>,
}

impl FormContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure message recorded for `field`
    pub fn push_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.get_or_insert_with(Vec::new).push(message.into());
        self.fields.push(field.to_string());
    }

    /// Every recorded message in the order it was recorded, if any
    pub fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }

    /// True when no failure was recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_none()
    }

    /// First message recorded for `field`
    pub fn get_error(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .zip(self.errors.iter().flatten())
            .find(|(f, _)| f.as_str() == field)
            .map(|(_, message)| message.as_str())
    }

    /// Every message recorded for `field`
    pub fn field_errors<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .zip(self.errors.iter().flatten())
            .filter(move |(f, _)| f.as_str() == field)
            .map(|(_, message)| message.as_str())
    }

    /// Take the error list
    pub fn into_errors(self) -> Option<Vec<String>> {
        self.errors
    }
}

/// A request as seen by the framework-agnostic middleware entry point
#[derive(Debug, Clone, Default)]
pub struct FormRequest {
    /// The submitted record, filtered in place
    pub body: Record,
    /// The form namespace the error list is attached to
    pub form: FormContext,
}

impl FormRequest {
    pub fn new(body: Record) -> Self {
        Self {
            body,
            form: FormContext::default(),
        }
    }
}

/// Immutable sequence of routines shared by every request of a route
#[derive(Clone)]
pub struct FormPipeline {
    routines: Arc<[Box<dyn FieldRoutine>]>,
}

impl FormPipeline {
    pub fn new(routines: Vec<Box<dyn FieldRoutine>>) -> Self {
        Self {
            routines: routines.into(),
        }
    }

    /// Number of routines in the pipeline
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Fields the routines are bound to, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.routines.iter().map(|routine| routine.field())
    }

    /// Run every routine against `record`, appending failures to `form`
    ///
    /// Filters mutate the record as they run; validators later in the
    /// pipeline see the filtered values. A filter error stops the run.
    pub fn apply(&self, record: &mut Record, form: &mut FormContext) -> Result<(), FormError> {
        for routine in self.routines.iter() {
            let outcome = routine.run(record)?;
            for message in outcome.errors.into_iter().flatten() {
                form.push_error(routine.field(), message);
            }
        }

        if current_config().debug {
            tracing::info!(errors = ?form.errors(), "Form pipeline completed");
        } else {
            tracing::debug!(errors = ?form.errors(), "Form pipeline completed");
        }
        Ok(())
    }

    /// Run against `record` with a fresh form context
    pub fn run(&self, record: &mut Record) -> Result<FormContext, FormError> {
        let mut form = FormContext::default();
        self.apply(record, &mut form)?;
        Ok(form)
    }

    /// Middleware entry point: filter and validate `request`, then call
    /// `next` exactly once, whatever the validation outcome
    pub fn handle<T>(
        &self,
        request: &mut FormRequest,
        next: impl FnOnce(&mut FormRequest) -> T,
    ) -> Result<T, FormError> {
        self.apply(&mut request.body, &mut request.form)?;
        Ok(next(request))
    }
}

impl fmt::Debug for FormPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormPipeline")
            .field("fields", &self.fields().collect::<Vec<_>>())
            .finish()
    }
}
