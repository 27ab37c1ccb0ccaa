//! HTTP front for the dispatcher (feature `server`).
//!
//! Routes:
//! - `POST /v1/chat/completions`: dispatch one chat request
//! - `GET /v1/usage`: the caller's bucket state
//! - `GET /health`, `GET /ready`: liveness and readiness
//! - `GET /metrics`: Prometheus exposition, when a handle is installed
//!
//! The caller is the value of `X-User-ID`, unless `[auth].api_keys` is
//! configured, in which case it is the identity mapped from the
//! `Authorization: Bearer` key.
//!
//! [`shutdown_signal`] resolves on SIGINT or SIGTERM and is meant for
//! `axum::serve(..).with_graceful_shutdown(..)`.

pub mod config;
mod routes;
mod shutdown;

pub use config::{CacheBackend, Config, Secrets};
pub use routes::{ApiError, AppState, router};
pub use shutdown::shutdown_signal;
