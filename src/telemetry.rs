//! Telemetry metric name constants.
//!
//! Centralised metric names for heimdall operations. The embedding
//! application installs its own `metrics` recorder (`heimd` installs a
//! Prometheus exporter); without a recorder installed, all metric calls are
//! no-ops and never influence a dispatch outcome.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `heimdall_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `backend`: backend name (e.g. "openai", "anthropic")
//! - `model`: requested model name
//! - `status`: outcome: "ok" or "error"
//! - `direction`: token direction: "prompt" or "completion"
//! - `op`: cache store operation: "get", "set" or "delete"
//! - `method`, `path`: HTTP method and matched route

/// Total backend requests dispatched.
///
/// Labels: `backend`, `model`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "heimdall_requests_total";

/// Backend request duration in seconds.
///
/// Labels: `backend`, `model`.
pub const REQUEST_DURATION_SECONDS: &str = "heimdall_request_duration_seconds";

/// Requests rejected by admission control.
pub const RATE_LIMITED_TOTAL: &str = "heimdall_rate_limited_total";

/// Total tokens reported by backends.
///
/// Labels: `backend`, `model`, `direction` ("prompt" | "completion").
pub const TOKENS_TOTAL: &str = "heimdall_tokens_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "heimdall_cache_hits_total";

/// Total response cache misses (including lookups degraded by store errors).
pub const CACHE_MISSES_TOTAL: &str = "heimdall_cache_misses_total";

/// Cache store failures swallowed by the response cache.
///
/// Labels: `op` ("get" | "set" | "delete").
pub const CACHE_ERRORS_TOTAL: &str = "heimdall_cache_errors_total";

/// HTTP requests answered by heimd, whatever the outcome.
///
/// Labels: `method`, `path`, `status` (numeric HTTP status).
pub const HTTP_REQUESTS_TOTAL: &str = "heimdall_http_requests_total";

/// HTTP request duration in seconds.
///
/// Labels: `method`, `path`.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "heimdall_http_request_duration_seconds";
