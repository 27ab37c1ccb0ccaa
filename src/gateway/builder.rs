//! Builder for configuring dispatcher instances

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{DEFAULT_REQUEST_TIMEOUT, Dispatcher};
use crate::cache::ResponseCache;
use crate::providers::{ChatBackend, ProviderRegistry, RoutingTable};
use crate::ratelimit::{RateLimitConfig, RateLimiter};
use crate::{HeimdallError, Result};

/// Builder for [`Dispatcher`].
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use heimdall::{Dispatcher, RateLimitConfig, RoutingTable, ChatBackend};
/// # fn demo(openai: Arc<dyn ChatBackend>) -> heimdall::Result<()> {
/// let dispatcher = Dispatcher::builder()
///     .rate_limit(RateLimitConfig::new(100, 1.0))
///     .backend(openai)
///     .routing(RoutingTable::new().rule("gpt-", "openai").default_backend("openai"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DispatcherBuilder {
    rate_limit: RateLimitConfig,
    limiter: Option<Arc<RateLimiter>>,
    cache: Option<ResponseCache>,
    backends: Vec<(String, Arc<dyn ChatBackend>)>,
    routing: RoutingTable,
    request_timeout: Duration,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            limiter: None,
            cache: None,
            backends: Vec::new(),
            routing: RoutingTable::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bucket parameters for a fresh limiter.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Use an existing limiter instead of creating one.
    ///
    /// Takes precedence over [`rate_limit`](Self::rate_limit).
    pub fn limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Enable cache-aside reuse of non-streaming responses.
    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Register a backend under its own name.
    pub fn backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        let name = backend.name().to_string();
        self.backends.push((name, backend));
        self
    }

    /// Register a backend under an explicit name.
    pub fn backend_as(mut self, name: impl Into<String>, backend: Arc<dyn ChatBackend>) -> Self {
        self.backends.push((name.into(), backend));
        self
    }

    /// Replace the routing table.
    pub fn routing(mut self, routing: RoutingTable) -> Self {
        self.routing = routing;
        self
    }

    /// Append one prefix rule to the routing table.
    pub fn route(mut self, prefix: impl Into<String>, backend: impl Into<String>) -> Self {
        self.routing = self.routing.rule(prefix, backend);
        self
    }

    /// Set the backend for models no rule matches.
    pub fn default_backend(mut self, backend: impl Into<String>) -> Self {
        self.routing = self.routing.default_backend(backend);
        self
    }

    /// Upper bound on a single backend call. Default: 60 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the dispatcher.
    ///
    /// Fails when no backend is registered or the timeout is zero. Routes
    /// naming an unregistered backend are allowed but logged.
    pub fn build(self) -> Result<Dispatcher> {
        if self.backends.is_empty() {
            return Err(HeimdallError::Configuration(
                "at least one backend must be registered".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(HeimdallError::Configuration(
                "request timeout must be non-zero".into(),
            ));
        }

        let mut registry = ProviderRegistry::new(self.routing);
        for (name, backend) in self.backends {
            registry.register_as(name, backend);
        }

        for missing in registry.unregistered_routes() {
            warn!(backend = missing, "routing refers to an unregistered backend");
        }

        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::new(self.rate_limit)));

        info!(
            backends = ?registry.names(),
            cache = self.cache.as_ref().map(|c| c.store().name()),
            capacity = limiter.config().capacity,
            refill_per_second = limiter.config().refill_per_second,
            "dispatcher ready"
        );

        Ok(Dispatcher {
            limiter,
            cache: self.cache,
            registry,
            request_timeout: self.request_timeout,
        })
    }
}
