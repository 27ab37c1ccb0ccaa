//! Per-caller admission control.
//!
//! [`RateLimiter`] owns one [`TokenBucket`] per caller identity. Buckets are
//! created lazily on first use and live for the lifetime of the process.
//!
//! # Locking
//!
//! The caller → bucket map sits behind a read/write lock and every bucket
//! behind its own mutex:
//!
//! ```text
//! allow("u1")
//!   │
//!   ├─ read lock ── bucket exists? ── yes ──┐
//!   │                                       │
//!   └─ no ── write lock ── recheck ── insert│
//!                                           ▼
//!                            bucket mutex: refill + consume
//! ```
//!
//! The recheck under the write lock guarantees at most one bucket per caller
//! under concurrent first use. Refill/consume only ever holds the bucket's
//! own mutex, so distinct callers never contend with each other.
//!
//! State is local to one process; there is no cross-instance coordination.

mod bucket;

pub use bucket::TokenBucket;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Default bucket capacity.
pub const DEFAULT_CAPACITY: u64 = 100;

/// Default refill rate (tokens per second).
pub const DEFAULT_REFILL_PER_SECOND: f64 = 1.0;

/// Bucket parameters applied to every caller.
///
/// ```toml
/// [rate_limit]
/// capacity = 100
/// refill_per_second = 1.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum tokens a bucket holds. Default: 100.
    #[serde(default = "default_capacity")]
    pub capacity: u64,
    /// Tokens added per second. Default: 1.0.
    #[serde(default = "default_refill")]
    pub refill_per_second: f64,
}

fn default_capacity() -> u64 {
    DEFAULT_CAPACITY
}

fn default_refill() -> f64 {
    DEFAULT_REFILL_PER_SECOND
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
        }
    }
}

impl RateLimitConfig {
    pub fn new(capacity: u64, refill_per_second: f64) -> Self {
        Self {
            capacity,
            refill_per_second,
        }
    }
}

/// Snapshot of one caller's bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketStats {
    pub available: u64,
    pub capacity: u64,
}

/// Registry of token buckets keyed by caller identity.
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, Arc<Mutex<TokenBucket>>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Refill the caller's bucket and take `cost` tokens if available.
    ///
    /// Returns `false` without consuming anything when the bucket is short.
    pub fn allow(&self, caller: &str, cost: u64) -> bool {
        let bucket = self.bucket(caller);
        let mut bucket = bucket.lock();
        bucket.try_acquire(cost)
    }

    /// Refill, then report the caller's available tokens and capacity.
    pub fn stats(&self, caller: &str) -> BucketStats {
        let bucket = self.bucket(caller);
        let mut bucket = bucket.lock();
        BucketStats {
            available: bucket.available(),
            capacity: bucket.capacity(),
        }
    }

    /// Number of callers with a bucket.
    pub fn len(&self) -> usize {
        self.buckets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get or lazily create the caller's bucket.
    fn bucket(&self, caller: &str) -> Arc<Mutex<TokenBucket>> {
        if let Some(bucket) = self.buckets.read().get(caller) {
            return Arc::clone(bucket);
        }

        let mut buckets = self.buckets.write();
        // another thread may have inserted while we waited for the write lock
        if let Some(bucket) = buckets.get(caller) {
            return Arc::clone(bucket);
        }
        let bucket = Arc::new(Mutex::new(TokenBucket::new(
            self.config.capacity,
            self.config.refill_per_second,
        )));
        buckets.insert(caller.to_string(), Arc::clone(&bucket));
        bucket
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
