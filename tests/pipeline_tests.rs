//! Tests for pipeline composition through the public API
//!
//! These tests verify that:
//! - Filters compose left-to-right and validators see filtered values
//! - Validation failures accumulate in declaration order
//! - Custom messages land at the right argument position
//! - Runtime-registered rules are reachable from builders

use form_pipeline::prelude::*;

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

// =============================================================================
// Filter Composition Tests
// =============================================================================

mod filter_tests {
    use super::*;

    #[test]
    fn test_filters_compose_left_to_right() {
        let pipeline = form![filter("name").trim().to_upper().truncate(3)];
        let mut data = record(json!({ "name": "  alice  " }));
        pipeline.run(&mut data).unwrap();
        assert_eq!(data["name"], json!("ALI"));
    }

    #[test]
    fn test_truncate_examples() {
        let pipeline = form![filter("long").truncate(5), filter("short").truncate(5)];
        let mut data = record(json!({ "long": "abcdefgh", "short": "abc" }));
        pipeline.run(&mut data).unwrap();
        assert_eq!(data["long"], json!("abcde"));
        assert_eq!(data["short"], json!("abc"));
    }

    #[test]
    fn test_numeric_filters_then_range_check() {
        let pipeline = form![
            filter("age").trim().to_int(),
            validate("age").min(18.0, "Must be an adult"),
        ];

        let mut adult = record(json!({ "age": " 42 " }));
        assert!(pipeline.run(&mut adult).unwrap().is_valid());
        assert_eq!(adult["age"], json!(42));

        let mut minor = record(json!({ "age": "12" }));
        let form = pipeline.run(&mut minor).unwrap();
        assert_eq!(form.get_error("age"), Some("Must be an adult"));
    }

    #[test]
    fn test_undefined_field_stays_undefined() {
        let pipeline = form![filter("missing").trim().to_upper()];
        let mut data = record(json!({ "other": 1 }));
        pipeline.run(&mut data).unwrap();
        assert!(!data.contains_key("missing"));
    }

    #[test]
    fn test_if_null_fills_undefined_field() {
        let pipeline = form![filter("role").if_null("member")];
        let mut data = record(json!({}));
        pipeline.run(&mut data).unwrap();
        assert_eq!(data["role"], json!("member"));
    }

    #[test]
    fn test_custom_filter_error_is_filter_error() {
        let pipeline = form![filter("a").custom(|_| anyhow::bail!("unreadable"))];
        let mut data = record(json!({ "a": "x" }));
        let err = pipeline.run(&mut data).unwrap_err();
        assert!(matches!(err, FormError::Filter { ref field, .. } if field == "a"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// Validator Tests
// =============================================================================

mod validator_tests {
    use super::*;

    #[test]
    fn test_no_validators_gives_absent_errors() {
        let pipeline = form![filter("a").trim()];
        let form = pipeline.run(&mut record(json!({ "a": "" }))).unwrap();
        assert_eq!(form.errors(), None);
    }

    #[test]
    fn test_equals_records_exact_message() {
        let pipeline = form![validate("age").equals(18, "Must be 18")];

        let form = pipeline.run(&mut record(json!({ "age": 17 }))).unwrap();
        assert_eq!(form.errors(), Some(&["Must be 18".to_string()][..]));

        let form = pipeline.run(&mut record(json!({ "age": 18 }))).unwrap();
        assert_eq!(form.errors(), None);
    }

    #[test]
    fn test_equals_is_loose() {
        let pipeline = form![validate("age").equals(18, "Must be 18")];
        let form = pipeline.run(&mut record(json!({ "age": "18" }))).unwrap();
        assert!(form.is_valid());
    }

    #[test]
    fn test_required_with_placeholder() {
        let pipeline = form![validate("choice").required_with("pick one", Some("Choose"))];
        let cases = [
            (json!({}), false),
            (json!({ "choice": null }), false),
            (json!({ "choice": "" }), false),
            (json!({ "choice": "pick one" }), false),
            (json!({ "choice": "red" }), true),
        ];
        for (input, valid) in cases {
            let form = pipeline.run(&mut record(input.clone())).unwrap();
            assert_eq!(form.is_valid(), valid, "input {input}");
        }
    }

    #[test]
    fn test_required_zero_with_blank_placeholder_passes() {
        let pipeline = form![validate("count").required_with("", None)];
        assert!(pipeline.run(&mut record(json!({ "count": 0 }))).unwrap().is_valid());

        let form = pipeline.run(&mut record(json!({ "count": "" }))).unwrap();
        assert_eq!(form.get_error("count"), Some("Field does not have a value."));
    }

    #[test]
    fn test_every_validator_sees_same_value() {
        let pipeline = form![
            validate("code")
                .len(5, None, "Too short")
                .is_uppercase("Uppercase only")
                .regex("^[A-Z]+$", "", "Letters only"),
        ];
        let form = pipeline.run(&mut record(json!({ "code": "ab1" }))).unwrap();
        assert_eq!(
            form.into_errors(),
            Some(vec![
                "Too short".to_string(),
                "Uppercase only".to_string(),
                "Letters only".to_string(),
            ])
        );
    }

    #[test]
    fn test_rule_by_name_uses_message_position() {
        let pipeline = form![
            validate("name")
                .rule("contains", vec![json!("x"), json!("Needs an x")])
                .unwrap()
                .rule("len", vec![json!(10), Value::Null, json!("Too short")])
                .unwrap()
                .rule("is_email", vec![])
                .unwrap(),
        ];
        let form = pipeline.run(&mut record(json!({ "name": "abc" }))).unwrap();
        assert_eq!(
            form.into_errors(),
            Some(vec![
                "Needs an x".to_string(),
                "Too short".to_string(),
                "Invalid email".to_string(),
            ])
        );
    }

    #[test]
    fn test_unknown_rule_fails_at_build_time() {
        let err = validate("x").rule("no_such_rule", vec![]).unwrap_err();
        assert!(matches!(err, FormError::UnknownRule { kind: RuleKind::Validator, .. }));

        let err = filter("x").rule("no_such_rule", vec![]).unwrap_err();
        assert!(matches!(err, FormError::UnknownRule { kind: RuleKind::Filter, .. }));
    }

    #[test]
    fn test_bad_regex_is_recorded_not_raised() {
        let pipeline = form![validate("x").regex("(", "", "Letters only")];
        let form = pipeline.run(&mut record(json!({ "x": "a" }))).unwrap();
        let errors = form.into_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_ne!(errors[0], "Letters only");
    }
}

// =============================================================================
// Runtime Registration Tests
// =============================================================================

mod registration_tests {
    use super::*;

    #[test]
    fn test_added_filter_is_available() {
        add_filter("pipeline_tests_reverse", |value: Value, _: &[Value]| {
            Ok(match value.as_str() {
                Some(s) => Value::String(s.chars().rev().collect()),
                None => value,
            })
        });

        let pipeline = form![
            filter("word")
                .rule("pipeline_tests_reverse", vec![])
                .unwrap()
        ];
        let mut data = record(json!({ "word": "abc" }));
        pipeline.run(&mut data).unwrap();
        assert_eq!(data["word"], json!("cba"));
    }

    #[test]
    fn test_added_validator_message_position() {
        add_validator(
            "pipeline_tests_starts_with",
            1,
            |value: &Value, args: &[Value]| {
                let prefix = args.first().and_then(Value::as_str).unwrap_or_default();
                match value.as_str() {
                    Some(s) if s.starts_with(prefix) => Ok(()),
                    _ => Err("Wrong prefix".to_string()),
                }
            },
        );

        let custom = form![
            validate("sku")
                .rule("pipeline_tests_starts_with", vec![json!("SKU-"), json!("Bad SKU")])
                .unwrap()
        ];
        let form = custom.run(&mut record(json!({ "sku": "X1" }))).unwrap();
        assert_eq!(form.get_error("sku"), Some("Bad SKU"));

        let default = form![
            validate("sku")
                .rule("pipeline_tests_starts_with", vec![json!("SKU-")])
                .unwrap()
        ];
        let form = default.run(&mut record(json!({ "sku": "X1" }))).unwrap();
        assert_eq!(form.get_error("sku"), Some("Wrong prefix"));

        let form = default.run(&mut record(json!({ "sku": "SKU-1" }))).unwrap();
        assert!(form.is_valid());
    }
}

// =============================================================================
// Middleware Entry Point Tests
// =============================================================================

mod handle_tests {
    use super::*;

    fn register_form() -> FormPipeline {
        form![
            filter("username").trim(),
            validate("username").required("Username required"),
        ]
    }

    #[test]
    fn test_trimmed_username_passes() {
        let mut request = FormRequest::new(record(json!({ "username": "  bob  " })));
        let valid = register_form()
            .handle(&mut request, |req| req.form.is_valid())
            .unwrap();
        assert!(valid);
        assert_eq!(request.body["username"], json!("bob"));
    }

    #[test]
    fn test_blank_username_fails_but_next_runs_once() {
        let mut request = FormRequest::new(record(json!({ "username": "   " })));
        let mut calls = 0;
        register_form()
            .handle(&mut request, |_| calls += 1)
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(request.body["username"], json!(""));
        assert_eq!(
            request.form.errors(),
            Some(&["Username required".to_string()][..])
        );
    }
}
