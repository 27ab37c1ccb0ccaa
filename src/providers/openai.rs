//! OpenAI chat completions backend.
//!
//! The unified request/response shape is the OpenAI one, so translation is
//! mostly pass-through. Also works against any OpenAI-compatible server
//! via [`OpenAiBackend::with_base_url`].

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

/// Default base URL for the OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Clone)]
pub struct OpenAiBackend {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenAiBackend {
    /// Create a backend for the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a backend with a custom base URL (proxies, compatible servers,
    /// wiremock).
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
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&WireRequest::from(request))
            .send()
            .await
            .map_err(|e| HeimdallError::Http(e.to_string()))?;

        let response = check_status(response).await?;

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| HeimdallError::Http(e.to_string()))?;

        Ok(wire.into())
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// The capability returns one complete response, so the wire call
    /// never streams.
    stream: bool,
}

impl<'a> From<&'a ChatRequest> for WireRequest<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    id: String,
    #[serde(default)]
    object: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    model: String,
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct WireChoice {
    #[serde(default)]
    index: u32,
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    role: Role,
    // null when the model answered with tool calls only
    #[serde(default)]
    content: Option<String>,
}

impl From<WireResponse> for ChatResponse {
    fn from(wire: WireResponse) -> Self {
        ChatResponse {
            id: wire.id,
            object: wire
                .object
                .unwrap_or_else(|| CHAT_COMPLETION_OBJECT.to_string()),
            created: wire.created.unwrap_or_else(unix_now),
            model: wire.model,
            choices: wire
                .choices
                .into_iter()
                .map(|c| Choice {
                    index: c.index,
                    message: Message {
                        role: c.message.role,
                        content: c.message.content.unwrap_or_default(),
                    },
                    finish_reason: c.finish_reason,
                })
                .collect(),
            usage: wire.usage.unwrap_or_default(),
        }
    }
}
