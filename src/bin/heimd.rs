//! heimd: Heimdall gateway daemon.
//!
//! Serves the [`Dispatcher`](heimdall::Dispatcher) over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use heimdall::server::config::{CacheBackend, Config, Secrets};
use heimdall::server::{AppState, router, shutdown_signal};
use heimdall::{CacheStore, Dispatcher, HeimdallError, MemoryCacheStore, ResponseCache};

/// Heimdall daemon: rate-limited, caching LLM gateway.
#[derive(Parser)]
#[command(name = "heimd")]
#[command(version)]
#[command(about = "Heimdall LLM gateway daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "HEIMDALL_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("heimdall=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_path = Config::resolve_path(args.config.as_deref())?;
    let config = Config::load_from(&config_path)?;
    let secrets = Secrets::load_beside(&config_path)?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| HeimdallError::Configuration(format!("metrics recorder: {e}")))?;

    let dispatcher = build_dispatcher(&config, &secrets).await?;

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| HeimdallError::Configuration(format!("Invalid address: {e}")))?;

    let state = AppState::new(Arc::new(dispatcher))
        .with_api_keys(config.auth.api_keys.clone())
        .with_metrics(metrics);

    info!(version = env!("CARGO_PKG_VERSION"), %addr, "heimd starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("heimd stopped");
    Ok(())
}

/// Assemble a [`Dispatcher`] from configuration.
async fn build_dispatcher(config: &Config, secrets: &Secrets) -> heimdall::Result<Dispatcher> {
    let mut builder = Dispatcher::builder()
        .rate_limit(config.rate_limit.clone())
        .routing(config.routing.clone())
        .request_timeout(config.server.request_timeout());

    // a provider is registered when its section is present AND a key is available
    #[cfg(feature = "openai")]
    if let Some(provider) = &config.providers.openai {
        match secrets.api_key("openai") {
            Some(key) => {
                let backend = match &provider.base_url {
                    Some(url) => heimdall::OpenAiBackend::with_base_url(key, url)?,
                    None => heimdall::OpenAiBackend::new(key)?,
                };
                builder = builder.backend(Arc::new(backend));
            }
            None => warn!("[providers.openai] configured but no API key found"),
        }
    }

    #[cfg(feature = "anthropic")]
    if let Some(provider) = &config.providers.anthropic {
        match secrets.api_key("anthropic") {
            Some(key) => {
                let backend = match &provider.base_url {
                    Some(url) => heimdall::AnthropicBackend::with_base_url(key, url)?,
                    None => heimdall::AnthropicBackend::new(key)?,
                };
                builder = builder.backend(Arc::new(backend));
            }
            None => warn!("[providers.anthropic] configured but no API key found"),
        }
    }

    if config.cache.enabled {
        let cache_config = config.cache.to_cache_config();
        let store: Arc<dyn CacheStore> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCacheStore::new(&cache_config)),
            CacheBackend::Redis => connect_redis(config.cache.redis_url.as_deref()).await?,
        };
        builder = builder.cache(ResponseCache::new(store, cache_config.ttl));
    }

    builder.build()
}

#[cfg(feature = "cache-redis")]
async fn connect_redis(url: Option<&str>) -> heimdall::Result<Arc<dyn CacheStore>> {
    let url = url.ok_or_else(|| {
        HeimdallError::Configuration("[cache] backend = \"redis\" requires redis_url".into())
    })?;
    Ok(Arc::new(heimdall::RedisCacheStore::connect(url).await?))
}

#[cfg(not(feature = "cache-redis"))]
async fn connect_redis(_url: Option<&str>) -> heimdall::Result<Arc<dyn CacheStore>> {
    Err(HeimdallError::Configuration(
        "redis cache requires the `cache-redis` feature".into(),
    ))
}
