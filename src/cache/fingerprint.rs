//! Cache keys for chat requests.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::Result;
use crate::types::{ChatRequest, Message};

/// Key prefix for chat completion entries.
pub const FINGERPRINT_PREFIX: &str = "chat:";

/// Every request field except `stream`, in a fixed order.
#[derive(Serialize)]
struct Canonical<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

/// Compute the cache fingerprint of a request.
///
/// SHA-256 over the JSON of `model`, `messages`, `temperature` and
/// `max_tokens`, hex-encoded and prefixed with `chat:`. Stable across
/// processes, so it can key a shared store. `stream` does not take part.
pub fn fingerprint(request: &ChatRequest) -> Result<String> {
    let canonical = Canonical {
        model: &request.model,
        messages: &request.messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, &canonical)?;
    Ok(format!("{FINGERPRINT_PREFIX}{:x}", hasher.finalize()))
}
