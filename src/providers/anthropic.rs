//! Anthropic Messages API backend.
//!
//! Translates the unified request into `POST /messages`:
//! - system messages move to the top-level `system` field
//! - `max_tokens` is mandatory upstream and defaults to
//!   [`DEFAULT_MAX_TOKENS`]
//!
//! and the reply back into the unified response: text blocks are
//! concatenated, `stop_reason` is mapped onto OpenAI finish reasons, and
//! input/output token counts become prompt/completion usage.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::ChatBackend;
use super::{check_status, unix_now};
use crate::types::{
    CHAT_COMPLETION_OBJECT, ChatRequest, ChatResponse, Choice, Message, Role, Usage,
};
use crate::{HeimdallError, Result};

/// Default base URL for the Anthropic API
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// API version sent in the `anthropic-version` header.
pub const API_VERSION: &str = "2023-06-01";

/// `max_tokens` used when the request does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Client for the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicBackend {
    api_key: String,
    http: Client,
    base_url: String,
}

impl AnthropicBackend {
    /// Create a backend for the public Anthropic API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a backend with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| HeimdallError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/messages", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest::from(request))
            .send()
            .await
            .map_err(|e| HeimdallError::Http(e.to_string()))?;

        let response = check_status(response).await?;

        let wire: MessagesResponse = response
            .json()
            .await
            .map_err(|e| HeimdallError::Http(e.to_string()))?;

        Ok(wire.into())
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatRequest> for MessagesRequest<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        Self {
            model: &request.model,
            messages,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
        }
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    id: String,
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: MessagesUsage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Default, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Map an Anthropic `stop_reason` onto the OpenAI vocabulary.
fn finish_reason(stop_reason: &str) -> String {
    match stop_reason {
        "end_turn" | "stop_sequence" => "stop",
        "max_tokens" => "length",
        "tool_use" => "tool_calls",
        other => other,
    }
    .to_string()
}

impl From<MessagesResponse> for ChatResponse {
    fn from(wire: MessagesResponse) -> Self {
        let content: String = wire
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        ChatResponse {
            id: wire.id,
            object: CHAT_COMPLETION_OBJECT.to_string(),
            created: unix_now(),
            model: wire.model,
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: wire.stop_reason.as_deref().map(finish_reason),
            }],
            usage: Usage::new(wire.usage.input_tokens, wire.usage.output_tokens),
        }
    }
}
