//! Structural validation of inbound requests.

use super::request::ChatRequest;
use crate::{HeimdallError, Result};

/// Upper bound accepted for `temperature`.
pub const MAX_TEMPERATURE: f32 = 2.0;

impl ChatRequest {
    /// Check the request is structurally sound before it enters the pipeline.
    ///
    /// Rejects an empty model name, an empty message list, a non-finite or
    /// out-of-range temperature, and `max_tokens == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(HeimdallError::MalformedRequest(
                "model must not be empty".to_string(),
            ));
        }
        if self.messages.is_empty() {
            return Err(HeimdallError::MalformedRequest(
                "messages must not be empty".to_string(),
            ));
        }
        if let Some(temp) = self.temperature
            && !(temp.is_finite() && (0.0..=MAX_TEMPERATURE).contains(&temp))
        {
            return Err(HeimdallError::MalformedRequest(format!(
                "temperature must be within 0.0..={MAX_TEMPERATURE}, got {temp}"
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(HeimdallError::MalformedRequest(
                "max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
