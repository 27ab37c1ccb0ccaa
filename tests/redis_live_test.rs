//! Live integration tests for RedisCacheStore.
//!
//! These tests talk to a real Redis server and are `#[ignore]` by default.
//!
//! Run with: `HEIMDALL_REDIS_URL=redis://127.0.0.1/ cargo test --test redis_live_test --features cache-redis -- --ignored`
#![cfg(feature = "cache-redis")]

use std::time::Duration;

use heimdall::{CacheStore, RedisCacheStore};

fn get_redis_url() -> String {
    std::env::var("HEIMDALL_REDIS_URL")
        .expect("HEIMDALL_REDIS_URL environment variable must be set for live tests")
}

/// Keys are scoped to this process so parallel runs do not collide.
fn key(name: &str) -> String {
    format!("heimdall-live-test:{}:{name}", std::process::id())
}

async fn connect() -> RedisCacheStore {
    RedisCacheStore::connect(&get_redis_url())
        .await
        .expect("live connect should succeed")
}

#[tokio::test]
#[ignore = "requires HEIMDALL_REDIS_URL"]
async fn test_live_set_then_get() {
    let store = connect().await;
    let key = key("round-trip");

    store
        .set(&key, b"{\"id\":\"chatcmpl-1\"}".to_vec(), Duration::from_secs(30))
        .await
        .expect("live set should succeed");

    let value = store.get(&key).await.expect("live get should succeed");
    assert_eq!(value.as_deref(), Some(&b"{\"id\":\"chatcmpl-1\"}"[..]));

    store.delete(&key).await.expect("cleanup should succeed");
}

#[tokio::test]
#[ignore = "requires HEIMDALL_REDIS_URL"]
async fn test_live_missing_key_is_none() {
    let store = connect().await;

    let value = store
        .get(&key("never-written"))
        .await
        .expect("live get should succeed");
    assert!(value.is_none());
}

#[tokio::test]
#[ignore = "requires HEIMDALL_REDIS_URL"]
async fn test_live_delete_removes_entry() {
    let store = connect().await;
    let key = key("delete");

    store
        .set(&key, b"cached".to_vec(), Duration::from_secs(30))
        .await
        .expect("live set should succeed");
    store
        .delete(&key)
        .await
        .expect("live delete should succeed");

    let value = store.get(&key).await.expect("live get should succeed");
    assert!(value.is_none(), "deleted key should miss");
}

#[tokio::test]
#[ignore = "requires HEIMDALL_REDIS_URL"]
async fn test_live_sub_second_ttl_is_accepted() {
    let store = connect().await;
    let key = key("short-ttl");

    store
        .set(&key, b"brief".to_vec(), Duration::from_millis(200))
        .await
        .expect("sub-second ttl should be written as one second");

    store.delete(&key).await.expect("cleanup should succeed");
}
