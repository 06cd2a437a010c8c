//! Registration form example
//!
//! Filters and validates a sign-up form, then echoes the outcome.
//!
//! ```sh
//! curl -X POST localhost:3000/register -H 'content-type: application/json' \
//!     -d '{"username":" Alice ","email":"alice@example.com","password":"hunter22","age":"30"}'
//! ```

use form_pipeline::prelude::*;
use tracing_subscriber::EnvFilter;

async fn register(form: FormContext, Json(body): Json<Value>) -> Response {
    match form.errors() {
        Some(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "errors": errors,
                "username": form.get_error("username"),
                "submitted": body,
            })),
        )
            .into_response(),
        None => (StatusCode::CREATED, Json(json!({ "user": body }))).into_response(),
    }
}

fn register_form() -> std::result::Result<FormPipeline, FormError> {
    Ok(form![
        filter("username").trim().to_lower(),
        validate("username")
            .required("Username required")
            .is_alphanumeric("Letters and numbers only")
            .len(3, Some(20), "Between 3 and 20 characters"),
        filter("email").trim().to_lower(),
        validate("email").is_email("Invalid email address"),
        filter("password").trim(),
        validate("password")
            .len(8, None, "Password too short")
            .rule("not_common_password", vec![])?,
        filter("age").to_int(),
        validate("age").min(13.0, "Too young to register"),
        filter("newsletter").to_boolean(),
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Ok(path) = std::env::var("FORM_CONFIG") {
        configure(FormConfig::from_yaml_file(&path)?);
    }

    add_validator("not_common_password", 0, |value: &Value, _: &[Value]| {
        match value.as_str() {
            Some("password" | "12345678" | "qwertyui") => Err("Password too common".to_string()),
            _ => Ok(()),
        }
    });

    let app = Router::new()
        .route(
            "/register",
            post(register).layer(from_fn_with_state(register_form()?, form_middleware)),
        )
        .route("/health", get(|| async { "ok" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("Listening on http://127.0.0.1:3000");
    axum::serve(listener, app).await?;

    Ok(())
}
