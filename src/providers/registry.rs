//! Provider registry: named backends plus the routing table.
//!
//! # Resolution Flow
//!
//! ```text
//! resolve("claude-sonnet-4")
//!          │
//!          ▼
//!  ┌──────────────────┐   no rule, no default
//!  │   RoutingTable   │ ─────────────────────────► UnsupportedModel
//!  └────────┬─────────┘
//!           │ "anthropic"
//!           ▼
//!  ┌──────────────────┐   name not registered
//!  │  named backends  │ ─────────────────────────► UnsupportedModel
//!  └────────┬─────────┘
//!           │
//!           ▼
//!   Arc<dyn ChatBackend>
//! ```
//!
//! There is no fallback chain: a model resolves to exactly one backend.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::routing::RoutingTable;
use super::traits::ChatBackend;
use crate::{HeimdallError, Result};

/// Named backends and the table that selects among them.
#[derive(Default)]
pub struct ProviderRegistry {
    backends: HashMap<String, Arc<dyn ChatBackend>>,
    routing: RoutingTable,
}

impl ProviderRegistry {
    /// Create a registry with no backends and the given routing table.
    pub fn new(routing: RoutingTable) -> Self {
        Self {
            backends: HashMap::new(),
            routing,
        }
    }

    /// Register a backend under its own [`ChatBackend::name`].
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register(&mut self, backend: Arc<dyn ChatBackend>) {
        let name = backend.name().to_string();
        self.register_as(name, backend);
    }

    /// Register a backend under an explicit name.
    pub fn register_as(&mut self, name: impl Into<String>, backend: Arc<dyn ChatBackend>) {
        let name = name.into();
        if self.backends.insert(name.clone(), backend).is_some() {
            warn!(backend = %name, "backend registered twice, keeping the latest");
        }
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Look up a registered backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ChatBackend>> {
        self.backends.get(name).cloned()
    }

    /// Names of all registered backends, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Backend names the routing table refers to that are not registered.
    ///
    /// Models routed to these names fail with `UnsupportedModel`.
    pub fn unregistered_routes(&self) -> Vec<&str> {
        self.routing
            .backends()
            .into_iter()
            .filter(|name| !self.backends.contains_key(*name))
            .collect()
    }

    /// Resolve the backend handling `model`.
    pub fn resolve(&self, model: &str) -> Result<Arc<dyn ChatBackend>> {
        self.resolve_named(model).map(|(_, backend)| backend)
    }

    /// Resolve `model` to the registered name and the backend behind it.
    ///
    /// The name is the one the backend was registered under, which differs
    /// from [`ChatBackend::name`] for backends added with
    /// [`register_as`](Self::register_as).
    pub fn resolve_named(&self, model: &str) -> Result<(&str, Arc<dyn ChatBackend>)> {
        self.routing
            .resolve(model)
            .and_then(|name| self.backends.get_key_value(name))
            .map(|(name, backend)| (name.as_str(), Arc::clone(backend)))
            .ok_or_else(|| HeimdallError::UnsupportedModel(model.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatRequest, ChatResponse};
    use async_trait::async_trait;

    struct NamedBackend(&'static str);

    #[async_trait]
    impl ChatBackend for NamedBackend {
        fn name(&self) -> &str {
            self.0
        }

        async fn chat_completion(&self, _request: &ChatRequest) -> Result<ChatResponse> {
            Err(HeimdallError::Http("not used".into()))
        }
    }

    fn registry(routing: RoutingTable) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new(routing);
        registry.register(Arc::new(NamedBackend("openai")));
        registry.register(Arc::new(NamedBackend("anthropic")));
        registry
    }

    #[test]
    fn resolves_by_prefix() {
        let registry = registry(
            RoutingTable::new()
                .rule("gpt-", "openai")
                .rule("claude-", "anthropic"),
        );
        assert_eq!(registry.resolve("gpt-4o").unwrap().name(), "openai");
        assert_eq!(registry.resolve("claude-3").unwrap().name(), "anthropic");
    }

    #[test]
    fn unmatched_without_default_is_unsupported() {
        let registry = registry(RoutingTable::new().rule("gpt-", "openai"));
        match registry.resolve("llama-70b") {
            Err(HeimdallError::UnsupportedModel(model)) => assert_eq!(model, "llama-70b"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected UnsupportedModel"),
        }
    }

    #[test]
    fn route_to_unregistered_backend_is_unsupported() {
        let registry = registry(RoutingTable::new().rule("gemini-", "google"));
        assert!(matches!(
            registry.resolve("gemini-pro"),
            Err(HeimdallError::UnsupportedModel(_))
        ));
        assert_eq!(registry.unregistered_routes(), vec!["google"]);
    }

    #[test]
    fn register_as_overrides_name() {
        let mut registry = ProviderRegistry::new(RoutingTable::new().default_backend("primary"));
        registry.register_as("primary", Arc::new(NamedBackend("openai")));
        assert_eq!(registry.resolve("anything").unwrap().name(), "openai");
        assert_eq!(registry.names(), vec!["primary"]);

        match registry.resolve_named("anything") {
            Ok((name, backend)) => {
                assert_eq!(name, "primary");
                assert_eq!(backend.name(), "openai");
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
