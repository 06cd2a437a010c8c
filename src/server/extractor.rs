//! Axum extractor for the form context
//!
//! [`form_middleware`](super::middleware::form_middleware) stores the
//! pipeline outcome in the request extensions. Handlers read it by taking a
//! [`FormContext`] argument; a route without the middleware sees an empty
//! context.

use crate::pipeline::FormContext;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

impl<S> FromRequestParts<S> for FormContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<FormContext>().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_missing_context_is_empty() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let form = tokio_test::block_on(FormContext::from_request_parts(&mut parts, &())).unwrap();
        assert!(form.is_valid());
        assert_eq!(form.errors(), None);
    }

    #[test]
    fn test_context_is_read_from_extensions() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let mut stored = FormContext::new();
        stored.push_error("email", "Invalid email");
        parts.extensions.insert(stored.clone());

        let form = tokio_test::block_on(FormContext::from_request_parts(&mut parts, &())).unwrap();
        assert_eq!(form, stored);
        assert_eq!(form.get_error("email"), Some("Invalid email"));
    }
}
