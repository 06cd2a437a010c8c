//! Axum middleware running a form pipeline ahead of a handler
//!
//! The middleware decodes the request body into a record, runs the
//! pipeline, and hands the handler a request whose body is the filtered
//! record in the encoding it arrived in. The [`FormContext`] is stored in
//! the request extensions, where the [`FormContext`] extractor picks it up.
//!
//! # Usage
//!
//! ```rust,ignore
//! let register = form![
//!     filter("username").trim(),
//!     validate("username").required("Username required"),
//! ];
//!
//! let app = Router::new().route(
//!     "/register",
//!     post(register_handler)
//!         .layer(axum::middleware::from_fn_with_state(register, form_middleware)),
//! );
//!
//! async fn register_handler(form: FormContext, Form(signup): Form<Signup>) -> Response {
//!     if !form.is_valid() { /* ... */ }
//! }
//! ```
//!
//! Bodies are read as JSON objects (`application/json`) or URL-encoded
//! forms (`application/x-www-form-urlencoded`); a field repeated in a
//! URL-encoded body becomes an array, and is written back as repeated
//! pairs. Fields a filter turned into `null` are left out of a re-encoded
//! URL-encoded body. Any other content type runs the pipeline on an empty
//! record and forwards the body untouched.
//!
//! Buffering honours the route's `DefaultBodyLimit`; a larger body is
//! answered with `413 Payload Too Large`.

use crate::core::error::FormError;
use crate::core::field::{Record, to_text};
use crate::pipeline::{FormContext, FormPipeline};
use axum::RequestExt;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use serde_json::Value;
use std::error::Error as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return BodyKind::Other;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::UrlEncoded
    } else {
        BodyKind::Other
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

async fn read_body(body: Body) -> Result<Bytes, FormError> {
    axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
        if is_length_limit(&e) {
            FormError::BodyTooLarge {
                message: e.to_string(),
            }
        } else {
            FormError::Body {
                message: e.to_string(),
            }
        }
    })
}

fn decode_json(bytes: &[u8]) -> Result<Record, FormError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(FormError::Body {
            message: format!("expected a JSON object, got {}", json_type(&other)),
        }),
        Err(e) => Err(FormError::Body {
            message: e.to_string(),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn decode_urlencoded(bytes: &[u8]) -> Result<Record, FormError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(bytes).map_err(|e| FormError::Body {
            message: e.to_string(),
        })?;

    let mut record = Record::new();
    for (key, value) in pairs {
        match record.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                record.insert(key, Value::String(value));
            }
        }
    }
    Ok(record)
}

fn encode_urlencoded(record: &Record) -> Result<String, FormError> {
    let mut pairs: Vec<(&str, String)> = Vec::with_capacity(record.len());
    for (key, value) in record {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| (key.as_str(), to_text(item))),
            ),
            other => pairs.push((key.as_str(), to_text(other))),
        }
    }
    serde_urlencoded::to_string(&pairs).map_err(|e| FormError::Body {
        message: e.to_string(),
    })
}

fn encode(kind: BodyKind, record: &Record) -> Result<Vec<u8>, FormError> {
    match kind {
        BodyKind::UrlEncoded => Ok(encode_urlencoded(record)?.into_bytes()),
        _ => serde_json::to_vec(record).map_err(|e| FormError::Body {
            message: e.to_string(),
        }),
    }
}

/// Run `pipeline` over the request body and return the request to forward
pub async fn apply_to_request(
    pipeline: &FormPipeline,
    request: Request,
) -> Result<Request, FormError> {
    let (mut parts, body) = request.with_limited_body().into_parts();
    let kind = body_kind(&parts.headers);
    let bytes = read_body(body).await?;

    let mut record = match kind {
        _ if bytes.is_empty() => Record::new(),
        BodyKind::Json => decode_json(&bytes)?,
        BodyKind::UrlEncoded => decode_urlencoded(&bytes)?,
        BodyKind::Other => Record::new(),
    };

    let mut form = parts.extensions.remove::<FormContext>().unwrap_or_default();
    pipeline.apply(&mut record, &mut form)?;
    parts.extensions.insert(form);

    let body = if kind == BodyKind::Other {
        Body::from(bytes)
    } else {
        let encoded = encode(kind, &record)?;
        parts
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(encoded.len()));
        Body::from(encoded)
    };

    Ok(Request::from_parts(parts, body))
}

/// Middleware for `axum::middleware::from_fn_with_state`
///
/// Always forwards to the next handler once the pipeline ran; only a
/// filter failure or an unreadable body ends the request early.
pub async fn form_middleware(
    State(pipeline): State<FormPipeline>,
    request: Request,
    next: Next,
) -> Response {
    match apply_to_request(&pipeline, request).await {
        Ok(request) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Form pipeline aborted the request");
            e.into_response()
        }
    }
}
