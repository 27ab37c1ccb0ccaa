//! Tests for ResponseCache over memory and failing stores.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use heimdall::{
    CacheConfig, CacheStore, ChatRequest, ChatResponse, Choice, HeimdallError, MemoryCacheStore,
    Message, ResponseCache, Result, Usage, fingerprint,
};

fn sample_response(text: &str) -> ChatResponse {
    ChatResponse {
        id: "chatcmpl-1".into(),
        object: "chat.completion".into(),
        created: 1_700_000_000,
        model: "gpt-4".into(),
        choices: vec![Choice {
            index: 0,
            message: Message::assistant(text),
            finish_reason: Some("stop".into()),
        }],
        usage: Usage::new(5, 7),
    }
}

fn memory_cache(ttl: Duration) -> ResponseCache {
    let config = CacheConfig::new().ttl(ttl);
    ResponseCache::new(Arc::new(MemoryCacheStore::new(&config)), config.ttl)
}

struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(HeimdallError::Cache("timeout".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
        Err(HeimdallError::Cache("timeout".into()))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(HeimdallError::Cache("timeout".into()))
    }
}

#[tokio::test]
async fn insert_then_lookup_returns_equal_response() {
    let cache = memory_cache(Duration::from_secs(60));
    let key = fingerprint(&ChatRequest::new("gpt-4", vec![Message::user("hi")])).unwrap();

    assert!(cache.lookup(&key).await.is_none());
    cache.insert(&key, &sample_response("hello")).await;
    assert_eq!(cache.lookup(&key).await, Some(sample_response("hello")));
}

#[tokio::test]
async fn later_insert_overwrites() {
    let cache = memory_cache(Duration::from_secs(60));
    cache.insert("chat:k", &sample_response("old")).await;
    cache.insert("chat:k", &sample_response("new")).await;
    assert_eq!(
        cache.lookup("chat:k").await.unwrap().content(),
        Some("new")
    );
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let cache = memory_cache(Duration::from_millis(50));
    cache.insert("chat:k", &sample_response("hello")).await;
    assert!(cache.lookup("chat:k").await.is_some());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(cache.lookup("chat:k").await.is_none());
}

#[tokio::test]
async fn invalidate_removes_entry() {
    let cache = memory_cache(Duration::from_secs(60));
    cache.insert("chat:k", &sample_response("hello")).await;
    cache.invalidate("chat:k").await.unwrap();
    assert!(cache.lookup("chat:k").await.is_none());
}

#[tokio::test]
async fn broken_store_reads_as_miss_and_swallows_writes() {
    let cache = ResponseCache::new(Arc::new(BrokenStore), Duration::from_secs(60));

    assert!(cache.lookup("chat:k").await.is_none());
    // must not panic or surface the error
    cache.insert("chat:k", &sample_response("hello")).await;
}

#[tokio::test]
async fn broken_store_invalidate_surfaces_error() {
    let cache = ResponseCache::new(Arc::new(BrokenStore), Duration::from_secs(60));
    let err = cache.invalidate("chat:k").await.unwrap_err();
    assert!(matches!(err, HeimdallError::Cache(_)));
}

#[tokio::test]
async fn garbage_bytes_read_as_miss() {
    let store = Arc::new(MemoryCacheStore::default());
    store
        .set("chat:k", vec![0xff, 0x00, 0x13], Duration::from_secs(60))
        .await
        .unwrap();

    let cache = ResponseCache::new(store, Duration::from_secs(60));
    assert!(cache.lookup("chat:k").await.is_none());
}

#[test]
fn equal_requests_share_a_fingerprint() {
    let a = ChatRequest::new("gpt-4", vec![Message::system("s"), Message::user("hi")])
        .temperature(0.7)
        .max_tokens(100);
    let b = a.clone().stream(true);
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());

    let reordered = ChatRequest::new("gpt-4", vec![Message::user("hi"), Message::system("s")])
        .temperature(0.7)
        .max_tokens(100);
    assert_ne!(fingerprint(&a).unwrap(), fingerprint(&reordered).unwrap());
}
