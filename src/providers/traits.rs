//! Backend capability trait.
//!
//! Every LLM vendor integration implements [`ChatBackend`] and nothing
//! else. The dispatcher never inspects a backend beyond this trait: it
//! does not retry, translate, or reinterpret backend errors.

use async_trait::async_trait;

use crate::Result;
use crate::types::{ChatRequest, ChatResponse};

/// Chat completion capability of one backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logging/metrics; matches the routing table entry.
    fn name(&self) -> &str;

    /// Perform one non-streaming chat completion.
    ///
    /// The adapter owns its wire-format translation. Any transport, status,
    /// or parsing failure is returned as an error and becomes a
    /// `BackendFailure` at the dispatcher.
    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse>;
}
