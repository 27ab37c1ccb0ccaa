//! Backends and the routing that selects them.
//!
//! [`ChatBackend`] is the single capability every backend provides.
//! [`ProviderRegistry`] owns the backends by name and resolves a model
//! through its [`RoutingTable`].

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;
pub mod registry;
pub mod routing;
pub mod traits;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicBackend;
#[cfg(feature = "openai")]
pub use openai::OpenAiBackend;
pub use registry::ProviderRegistry;
pub use routing::{RouteRule, RoutingTable};
pub use traits::ChatBackend;

#[cfg(any(feature = "openai", feature = "anthropic"))]
use crate::{HeimdallError, Result};

/// Turn a non-success HTTP status into [`HeimdallError::Api`], keeping the
/// response body as the message.
#[cfg(any(feature = "openai", feature = "anthropic"))]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown").to_string()
    } else {
        body
    };

    Err(HeimdallError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Seconds since the Unix epoch, for responses that carry no timestamp.
#[cfg(any(feature = "openai", feature = "anthropic"))]
pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
