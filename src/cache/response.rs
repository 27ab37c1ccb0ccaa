//! Cache-aside response reuse for chat completions.
//!
//! [`ResponseCache`] sits in the [`Dispatcher`](crate::gateway::Dispatcher)
//! in front of the backend call. It serializes [`ChatResponse`]s to JSON
//! and stores them in any [`CacheStore`] under the request
//! [fingerprint](super::fingerprint).
//!
//! # Failure policy
//!
//! The cache is an optimisation, never a dependency:
//!
//! - a store error on lookup, or a stored value that no longer decodes,
//!   is reported as a miss;
//! - a store error on write is logged and dropped.
//!
//! Both paths emit [`CACHE_ERRORS_TOTAL`](crate::telemetry::CACHE_ERRORS_TOTAL).
//! Streaming requests never reach this type.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::store::CacheStore;
use crate::Result;
use crate::telemetry;
use crate::types::ChatResponse;

/// Configuration for the response cache.
///
/// ```rust
/// # use heimdall::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(10_000)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the in-memory store. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live for cached responses. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Response cache over a pluggable [`CacheStore`].
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a cached response.
    ///
    /// Returns `None` on miss, on store failure, and on undecodable data.
    /// Emits cache hit/miss metrics.
    pub async fn lookup(&self, fingerprint: &str) -> Option<ChatResponse> {
        let found = match self.store.get(fingerprint).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    error = %e,
                    "cache lookup failed, treating as miss"
                );
                metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "op" => "get").increment(1);
                None
            }
        };

        let response = found.and_then(|bytes| match serde_json::from_slice(&bytes) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    error = %e,
                    "cached response does not decode, treating as miss"
                );
                metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "op" => "get").increment(1);
                None
            }
        });

        if response.is_some() {
            debug!(fingerprint, "cache hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        } else {
            debug!(fingerprint, "cache miss");
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        }
        response
    }

    /// Store a response, best effort. Failures are logged, never returned.
    pub async fn insert(&self, fingerprint: &str, response: &ChatResponse) {
        if let Err(e) = self.try_insert(fingerprint, response).await {
            warn!(store = self.store.name(), error = %e, "cache write failed, dropping");
            metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "op" => "set").increment(1);
        }
    }

    async fn try_insert(&self, fingerprint: &str, response: &ChatResponse) -> Result<()> {
        let bytes = serde_json::to_vec(response)?;
        self.store.set(fingerprint, bytes, self.ttl).await
    }

    /// Remove a cached response.
    ///
    /// Unlike lookups and writes, the store error is returned to the caller.
    pub async fn invalidate(&self, fingerprint: &str) -> Result<()> {
        let result = self.store.delete(fingerprint).await;
        if let Err(e) = &result {
            warn!(store = self.store.name(), error = %e, "cache delete failed");
            metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "op" => "delete").increment(1);
        }
        result
    }
}
