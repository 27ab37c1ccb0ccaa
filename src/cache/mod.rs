//! Caching subsystem.
//!
//! - [`CacheStore`]: the key-value capability (get/set/delete with a
//!   distinguished miss). [`MemoryCacheStore`] keeps entries in-process;
//!   `RedisCacheStore` (feature `cache-redis`) shares them across
//!   instances.
//!
//! - [`ResponseCache`]: cache-aside reuse of chat responses on top of any
//!   store, keyed by [`fingerprint()`]. Store failures degrade to misses.

pub mod fingerprint;
#[cfg(feature = "cache-redis")]
pub mod redis_store;
pub mod response;
pub mod store;

pub use fingerprint::{FINGERPRINT_PREFIX, fingerprint};
#[cfg(feature = "cache-redis")]
pub use redis_store::RedisCacheStore;
pub use response::{CacheConfig, ResponseCache};
pub use store::{CacheStore, MemoryCacheStore};
