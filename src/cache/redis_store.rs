//! Redis-backed cache store, shared by every gateway instance that points
//! at the same server.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::store::CacheStore;
use crate::{HeimdallError, Result};

/// Cache store speaking to Redis through a reconnecting connection manager.
///
/// Values are written with `SET key value EX ttl`; Redis expiry is the only
/// invalidation besides explicit deletes.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1/`) and verify with `PING`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        let mut conn = ConnectionManager::new(client).await.map_err(cache_error)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(Self { conn })
    }
}

/// `EX` takes whole seconds and rejects 0, so sub-second TTLs round up to 1.
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn cache_error(err: redis::RedisError) -> HeimdallError {
    HeimdallError::Cache(err.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, expiry_secs(ttl))
            .await
            .map_err(cache_error)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(cache_error)
    }
}
