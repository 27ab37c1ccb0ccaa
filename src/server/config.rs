//! Configuration loading for heimd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.heimdall/config.toml` (user)
//! 3. `/etc/heimdall/config.toml` (system)
//!
//! Secrets live in `secrets.toml` next to the resolved config file and must
//! not be readable by group or others. Missing keys fall back to
//! `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::providers::RoutingTable;
use crate::ratelimit::RateLimitConfig;
use crate::{HeimdallError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub routing: RoutingTable,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080).
    #[serde(default = "default_address")]
    pub address: String,
    /// Upper bound on one backend call in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Which store backs the response cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Required when `backend = "redis"`.
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            ttl_secs: default_ttl(),
            max_entries: default_max_entries(),
            redis_url: None,
        }
    }
}

impl CacheSection {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.max_entries)
            .ttl(Duration::from_secs(self.ttl_secs))
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u64 {
    3600
}

fn default_max_entries() -> u64 {
    10_000
}

/// Provider configurations. A provider is enabled when its section is
/// present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: Option<ProviderConfig>,
    #[serde(default)]
    pub anthropic: Option<ProviderConfig>,
}

/// Per-provider settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Override the vendor's base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// `[auth]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer key → caller identity. When empty, callers identify with
    /// the `X-User-ID` header.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openai: Option<ApiKeySecret>,
    #[serde(default)]
    pub anthropic: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Provider name → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(&str, &str)] = &[
    ("openai", "OPENAI_API_KEY"),
    ("anthropic", "ANTHROPIC_API_KEY"),
];

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(explicit_path)?;
        Self::load_from(&path)
    }

    /// Parse the config file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HeimdallError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HeimdallError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(HeimdallError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".heimdall").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/heimdall/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(HeimdallError::Configuration(
            "No config file found. Create ~/.heimdall/config.toml or /etc/heimdall/config.toml"
                .to_string(),
        ))
    }
}

impl Secrets {
    /// Load `secrets.toml` from the directory holding `config_path`.
    ///
    /// Returns empty secrets if the file does not exist.
    pub fn load_beside(config_path: &Path) -> Result<Self> {
        let path = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("secrets.toml");
        if !path.exists() {
            return Ok(Secrets::default());
        }
        Self::check_permissions(&path)?;
        Self::load_from_file(&path)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HeimdallError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HeimdallError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Reject secrets files with any group or other permission bit set.
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            HeimdallError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(HeimdallError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// API key for a provider, falling back to its environment variable.
    pub fn api_key(&self, provider: &str) -> Option<String> {
        let from_file = match provider {
            "openai" => self.openai.as_ref(),
            "anthropic" => self.anthropic.as_ref(),
            _ => None,
        }
        .map(|s| s.api_key.clone());

        from_file.or_else(|| {
            PROVIDER_ENV_VARS
                .iter()
                .find(|(name, _)| *name == provider)
                .and_then(|(_, env_var)| std::env::var(env_var).ok())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.address, "127.0.0.1:8080");
        assert_eq!(config.server.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(config.routing.rules.is_empty());
        assert!(config.routing.default.is_none());
        assert!(config.providers.openai.is_none());
        assert!(config.auth.api_keys.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:9000"
            request_timeout_secs = 5

            [rate_limit]
            capacity = 10
            refill_per_second = 0.1

            [cache]
            backend = "redis"
            ttl_secs = 60
            redis_url = "redis://127.0.0.1/"

            [routing]
            default = "openai"
            rules = [
                { prefix = "gpt-", backend = "openai" },
                { prefix = "claude-", backend = "anthropic" },
            ]

            [providers.openai]
            base_url = "http://localhost:1234/v1"

            [providers.anthropic]

            [auth]
            api_keys = { "sk-test" = "u1" }
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(config.rate_limit, RateLimitConfig::new(10, 0.1));
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.to_cache_config().ttl, Duration::from_secs(60));
        assert_eq!(config.cache.max_entries, 10_000);
        assert_eq!(config.routing.resolve("claude-3"), Some("anthropic"));
        assert_eq!(config.routing.resolve("llama"), Some("openai"));
        assert_eq!(
            config.providers.openai.unwrap().base_url.as_deref(),
            Some("http://localhost:1234/v1")
        );
        assert!(config.providers.anthropic.unwrap().base_url.is_none());
        assert_eq!(config.auth.api_keys["sk-test"], "u1");
    }

    #[test]
    fn unknown_cache_backend_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[cache]\nbackend = \"disk\"");
        assert!(result.is_err());
    }

    #[test]
    fn parse_secrets() {
        let toml = r#"
            [openai]
            api_key = "sk-test-key"
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.openai.as_ref().unwrap().api_key, "sk-test-key");
        assert!(secrets.anthropic.is_none());
    }

    #[test]
    fn api_key_prefers_secrets_file() {
        let secrets = Secrets {
            openai: Some(ApiKeySecret {
                api_key: "from-file".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(secrets.api_key("openai"), Some("from-file".to_string()));
        assert_eq!(secrets.api_key("mistral"), None);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = Config::resolve_path(Some(Path::new("/nonexistent/heimdall.toml"))).unwrap_err();
        assert!(matches!(err, HeimdallError::Configuration(_)));
    }

    #[cfg(unix)]
    #[test]
    fn secrets_with_open_permissions_are_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();
        let secrets_path = dir.path().join("secrets.toml");
        fs::write(&secrets_path, "[openai]\napi_key = \"k\"\n").unwrap();

        fs::set_permissions(&secrets_path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(Secrets::load_beside(&config_path).is_err());

        fs::set_permissions(&secrets_path, fs::Permissions::from_mode(0o600)).unwrap();
        let secrets = Secrets::load_beside(&config_path).unwrap();
        assert_eq!(secrets.api_key("openai"), Some("k".to_string()));
    }

    #[test]
    fn missing_secrets_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = Secrets::load_beside(&dir.path().join("config.toml")).unwrap();
        assert!(secrets.openai.is_none());
        assert!(secrets.anthropic.is_none());
    }
}
