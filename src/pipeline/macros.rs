//! Declarative pipeline construction

/// Compose filter and validator chains into a [`FormPipeline`](crate::pipeline::FormPipeline)
///
/// Routines run in the order they are listed.
///
/// # Example
///
/// ```rust,ignore
/// let register = form![
///     filter("username").trim().to_lower(),
///     validate("username")
///         .required("Username required")
///         .is_alphanumeric("Letters and numbers only"),
///     filter("age").to_int(),
///     validate("age").min(18.0, "Must be an adult"),
/// ];
/// ```
#[macro_export]
macro_rules! form {
    ($( $routine:expr ),* $(,)?) => {
        $crate::pipeline::FormPipeline::new(vec![
            $( $crate::pipeline::boxed($routine) ),*
        ])
    };
}
