//! Heimdall - rate-limited, cache-aside request gateway for LLM backends
//!
//! Every chat request passes through a [`Dispatcher`], which admits it
//! against the caller's token bucket, answers it from the response cache
//! when it can, and otherwise forwards it to the backend its model routes
//! to.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use heimdall::{
//!     CacheConfig, ChatRequest, Dispatcher, MemoryCacheStore, Message, OpenAiBackend,
//!     RateLimitConfig, ResponseCache,
//! };
//!
//! #[tokio::main]
//! async fn main() -> heimdall::Result<()> {
//!     let config = CacheConfig::default();
//!     let store = Arc::new(MemoryCacheStore::new(&config));
//!
//!     let dispatcher = Dispatcher::builder()
//!         .rate_limit(RateLimitConfig::new(100, 1.0))
//!         .cache(ResponseCache::new(store, config.ttl))
//!         .backend(Arc::new(OpenAiBackend::new("sk-your-key")?))
//!         .route("gpt-", "openai")
//!         .build()?;
//!
//!     let response = dispatcher
//!         .dispatch(
//!             Some("u1"),
//!             ChatRequest::new("gpt-4o", vec![Message::user("What is the capital of France?")]),
//!         )
//!         .await?;
//!
//!     println!("{}", response.content().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod ratelimit;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use error::{HeimdallError, Outcome, Result};
pub use gateway::{Dispatcher, DispatcherBuilder};

#[cfg(feature = "cache-redis")]
pub use cache::RedisCacheStore;
pub use cache::{CacheConfig, CacheStore, MemoryCacheStore, ResponseCache, fingerprint};

#[cfg(feature = "anthropic")]
pub use providers::AnthropicBackend;
#[cfg(feature = "openai")]
pub use providers::OpenAiBackend;
pub use providers::{ChatBackend, ProviderRegistry, RouteRule, RoutingTable};

pub use ratelimit::{BucketStats, RateLimitConfig, RateLimiter};

pub use types::{ChatRequest, ChatResponse, Choice, Message, Role, Usage};
