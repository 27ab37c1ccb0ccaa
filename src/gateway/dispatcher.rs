use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use super::DispatcherBuilder;
use crate::cache::{ResponseCache, fingerprint};
use crate::providers::{ChatBackend, ProviderRegistry};
use crate::ratelimit::{BucketStats, RateLimiter};
use crate::telemetry;
use crate::types::{ChatRequest, ChatResponse, Usage};
use crate::{HeimdallError, Result};

/// Upper bound on one backend call unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Admission, cache reuse, and routing in front of a set of backends.
///
/// A dispatch runs these steps in order and stops at the first one that
/// fails:
///
/// 1. reject a missing or empty caller identity
/// 2. reject a structurally invalid request (no token is spent)
/// 3. charge one token from the caller's bucket
/// 4. for non-streaming requests, answer from the cache on a hit
/// 5. resolve the model to a backend
/// 6. call the backend under the request timeout
/// 7. for non-streaming requests, store the response (best effort)
///
/// Every step after admission has paid, so a cache hit and an unsupported
/// model both cost the caller one token.
pub struct Dispatcher {
    pub(super) limiter: Arc<RateLimiter>,
    pub(super) cache: Option<ResponseCache>,
    pub(super) registry: ProviderRegistry,
    pub(super) request_timeout: Duration,
}

impl Dispatcher {
    /// Start configuring a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Handle one request on behalf of `caller`.
    #[instrument(
        name = "heimdall.dispatch",
        skip(self, caller, request),
        fields(caller = caller.unwrap_or_default(), model = %request.model, stream = request.stream)
    )]
    pub async fn dispatch(
        &self,
        caller: Option<&str>,
        request: ChatRequest,
    ) -> Result<ChatResponse> {
        let caller = match caller {
            Some(caller) if !caller.is_empty() => caller,
            _ => return Err(HeimdallError::MissingIdentity),
        };

        request.validate()?;

        if !self.limiter.allow(caller, 1) {
            warn!(caller, "rate limit exceeded");
            metrics::counter!(telemetry::RATE_LIMITED_TOTAL).increment(1);
            return Err(HeimdallError::RateLimitExceeded);
        }
        debug!(caller, "admitted");

        let cache_key = self.cache_key(&request);

        if let (Some(cache), Some(key)) = (&self.cache, cache_key.as_deref())
            && let Some(hit) = cache.lookup(key).await
        {
            return Ok(hit);
        }

        let (name, backend) = self.registry.resolve_named(&request.model)?;
        debug!(backend = name, "routed");
        let response = self.call_backend(name, backend.as_ref(), &request).await?;

        if let (Some(cache), Some(key)) = (&self.cache, cache_key.as_deref()) {
            cache.insert(key, &response).await;
        }

        Ok(response)
    }

    /// Current bucket state for `caller`. Does not consume a token.
    pub fn stats(&self, caller: &str) -> BucketStats {
        self.limiter.stats(caller)
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Fingerprint for a cacheable request; `None` when the cache is off,
    /// the request streams, or the request cannot be fingerprinted.
    fn cache_key(&self, request: &ChatRequest) -> Option<String> {
        if self.cache.is_none() || request.stream {
            return None;
        }
        match fingerprint(request) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "cannot fingerprint request, bypassing cache");
                None
            }
        }
    }

    /// Call `backend` under the request timeout. `name` is the registry
    /// name the model routed to; errors and metrics are reported under it.
    async fn call_backend(
        &self,
        name: &str,
        backend: &dyn ChatBackend,
        request: &ChatRequest,
    ) -> Result<ChatResponse> {
        let start = Instant::now();

        let result = match tokio::time::timeout(
            self.request_timeout,
            backend.chat_completion(request),
        )
        .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(HeimdallError::backend(name, e)),
            Err(_) => Err(HeimdallError::BackendFailure {
                backend: name.to_string(),
                message: format!("timed out after {:?}", self.request_timeout),
            }),
        };

        record_request(name, &request.model, start, result.is_ok());
        match &result {
            Ok(response) => record_token_usage(name, &request.model, &response.usage),
            Err(e) => warn!(backend = name, error = %e, "backend call failed"),
        }
        result
    }
}

fn record_request(backend: &str, model: &str, start: Instant, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "backend" => backend.to_owned(),
        "model" => model.to_owned(),
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
        "backend" => backend.to_owned(),
        "model" => model.to_owned(),
    )
    .record(start.elapsed().as_secs_f64());
}

fn record_token_usage(backend: &str, model: &str, usage: &Usage) {
    metrics::counter!(telemetry::TOKENS_TOTAL,
        "backend" => backend.to_owned(),
        "model" => model.to_owned(),
        "direction" => "prompt",
    )
    .increment(u64::from(usage.prompt_tokens));
    metrics::counter!(telemetry::TOKENS_TOTAL,
        "backend" => backend.to_owned(),
        "model" => model.to_owned(),
        "direction" => "completion",
    )
    .increment(u64::from(usage.completion_tokens));
}
