//! Heimdall error types

/// Heimdall error types
#[derive(Debug, thiserror::Error)]
pub enum HeimdallError {
    // Dispatch outcomes
    #[error("missing caller identity")]
    MissingIdentity,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    /// Any transport, status, or parsing failure from a backend. The
    /// backend's own detail is carried opaquely in `message`.
    #[error("backend '{backend}' failed: {message}")]
    BackendFailure { backend: String, message: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    // Adapter-internal errors, wrapped into `BackendFailure` by the dispatcher
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Infrastructure errors
    #[error("cache error: {0}")]
    Cache(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Coarse class of a failure, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Transient refusal; the same request may succeed later.
    RetryLater,
    /// The request itself is wrong and must be changed.
    FixRequest,
    /// A backend failed to produce an answer.
    Upstream,
    /// Gateway-side misconfiguration or infrastructure fault.
    Internal,
}

impl HeimdallError {
    /// Stable, machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            HeimdallError::MissingIdentity => "missing_identity",
            HeimdallError::RateLimitExceeded => "rate_limit_exceeded",
            HeimdallError::UnsupportedModel(_) => "unsupported_model",
            HeimdallError::BackendFailure { .. } => "backend_failure",
            HeimdallError::MalformedRequest(_) => "malformed_request",
            HeimdallError::Http(_) | HeimdallError::Api { .. } | HeimdallError::Json(_) => {
                "backend_failure"
            }
            HeimdallError::Cache(_) => "cache",
            HeimdallError::Configuration(_) => "configuration",
        }
    }

    /// Which class of outcome the caller should infer.
    pub fn outcome(&self) -> Outcome {
        match self {
            HeimdallError::RateLimitExceeded => Outcome::RetryLater,
            HeimdallError::MissingIdentity
            | HeimdallError::UnsupportedModel(_)
            | HeimdallError::MalformedRequest(_) => Outcome::FixRequest,
            HeimdallError::BackendFailure { .. }
            | HeimdallError::Http(_)
            | HeimdallError::Api { .. }
            | HeimdallError::Json(_) => Outcome::Upstream,
            HeimdallError::Cache(_) | HeimdallError::Configuration(_) => Outcome::Internal,
        }
    }

    /// HTTP status code a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            HeimdallError::MissingIdentity => 401,
            HeimdallError::RateLimitExceeded => 429,
            HeimdallError::UnsupportedModel(_) | HeimdallError::MalformedRequest(_) => 400,
            HeimdallError::BackendFailure { .. }
            | HeimdallError::Http(_)
            | HeimdallError::Api { .. }
            | HeimdallError::Json(_) => 502,
            HeimdallError::Cache(_) | HeimdallError::Configuration(_) => 500,
        }
    }

    /// Wrap an arbitrary backend-side error as a [`HeimdallError::BackendFailure`].
    ///
    /// An error that is already a `BackendFailure` is passed through unchanged.
    pub fn backend(backend: impl Into<String>, err: HeimdallError) -> Self {
        match err {
            already @ HeimdallError::BackendFailure { .. } => already,
            other => HeimdallError::BackendFailure {
                backend: backend.into(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for Heimdall operations
pub type Result<T> = std::result::Result<T, HeimdallError>;
