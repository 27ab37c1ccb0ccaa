//! Tests for error classification and HTTP status mapping.

use heimdall::{HeimdallError, Outcome};

#[test]
fn dispatch_errors_map_to_status_and_outcome() {
    let cases = [
        (HeimdallError::MissingIdentity, 401, "missing_identity", Outcome::FixRequest),
        (HeimdallError::RateLimitExceeded, 429, "rate_limit_exceeded", Outcome::RetryLater),
        (
            HeimdallError::UnsupportedModel("llama".into()),
            400,
            "unsupported_model",
            Outcome::FixRequest,
        ),
        (
            HeimdallError::MalformedRequest("messages must not be empty".into()),
            400,
            "malformed_request",
            Outcome::FixRequest,
        ),
        (
            HeimdallError::BackendFailure {
                backend: "openai".into(),
                message: "boom".into(),
            },
            502,
            "backend_failure",
            Outcome::Upstream,
        ),
        (HeimdallError::Cache("down".into()), 500, "cache", Outcome::Internal),
    ];

    for (err, status, code, outcome) in cases {
        assert_eq!(err.status_code(), status, "{err}");
        assert_eq!(err.code(), code, "{err}");
        assert_eq!(err.outcome(), outcome, "{err}");
    }
}

#[test]
fn backend_wraps_adapter_errors() {
    let err = HeimdallError::backend(
        "anthropic",
        HeimdallError::Api {
            status: 503,
            message: "overloaded".into(),
        },
    );
    match err {
        HeimdallError::BackendFailure { backend, message } => {
            assert_eq!(backend, "anthropic");
            assert!(message.contains("503"));
            assert!(message.contains("overloaded"));
        }
        other => panic!("expected BackendFailure, got {other:?}"),
    }
}

#[test]
fn backend_keeps_existing_backend_failure() {
    let inner = HeimdallError::BackendFailure {
        backend: "inner".into(),
        message: "m".into(),
    };
    match HeimdallError::backend("outer", inner) {
        HeimdallError::BackendFailure { backend, .. } => assert_eq!(backend, "inner"),
        other => panic!("expected BackendFailure, got {other:?}"),
    }
}

#[test]
fn json_errors_convert() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
    let err: HeimdallError = parse.unwrap_err().into();
    assert!(matches!(err, HeimdallError::Json(_)));
    assert_eq!(err.outcome(), Outcome::Upstream);
}

#[test]
fn display_is_human_readable() {
    assert_eq!(
        HeimdallError::UnsupportedModel("llama".into()).to_string(),
        "unsupported model: llama"
    );
    assert_eq!(
        HeimdallError::RateLimitExceeded.to_string(),
        "rate limit exceeded"
    );
}
