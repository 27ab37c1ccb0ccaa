//! Model-to-backend routing table.
//!
//! Resolution is first-match over an ordered list of prefix rules. When no
//! rule matches, the optional default backend is used; without a default,
//! resolution fails closed.
//!
//! ```toml
//! [routing]
//! default = "openai"
//! rules = [
//!     { prefix = "gpt-", backend = "openai" },
//!     { prefix = "claude-", backend = "anthropic" },
//! ]
//! ```

use serde::Deserialize;

/// One `(prefix, backend)` rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRule {
    /// Model-name prefix this rule matches.
    pub prefix: String,
    /// Name of the backend handling matching models.
    pub backend: String,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            backend: backend.into(),
        }
    }

    fn matches(&self, model: &str) -> bool {
        model.starts_with(&self.prefix)
    }
}

/// Ordered prefix rules plus an optional default backend.
///
/// Immutable once the dispatcher is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoutingTable {
    #[serde(default)]
    pub rules: Vec<RouteRule>,
    /// Backend for models no rule matches. `None` means unmatched models
    /// are rejected.
    #[serde(default)]
    pub default: Option<String>,
}

impl RoutingTable {
    /// Create an empty table (no rules, no default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; rules are tried in insertion order.
    pub fn rule(mut self, prefix: impl Into<String>, backend: impl Into<String>) -> Self {
        self.rules.push(RouteRule::new(prefix, backend));
        self
    }

    /// Set the default backend.
    pub fn default_backend(mut self, backend: impl Into<String>) -> Self {
        self.default = Some(backend.into());
        self
    }

    /// Name of the backend responsible for `model`, if any.
    pub fn resolve(&self, model: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(model))
            .map(|rule| rule.backend.as_str())
            .or(self.default.as_deref())
    }

    /// Every backend name the table can resolve to, in first-seen order.
    pub fn backends(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self
            .rules
            .iter()
            .map(|r| r.backend.as_str())
            .chain(self.default.as_deref());
        for name in all {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
