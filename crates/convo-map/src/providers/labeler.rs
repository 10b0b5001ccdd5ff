//! Labeling model trait

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::error::Result;

/// Outcome of a failed label request, as seen by the retry loop
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LabelError {
    /// The model server asked us to slow down (HTTP 429)
    #[error("rate limited")]
    RateLimited,

    /// Any other failure: transport, non-2xx status, unreadable or empty reply
    #[error("{0}")]
    Failed(String),
}

/// Trait for models that turn a prompt into a short topic label
///
/// Implementations:
/// - `OllamaLabeler`: Local Ollama server
/// - `OpenAiLabeler`: OpenAI-compatible chat completions API
#[async_trait]
pub trait LabelProvider: Send + Sync {
    /// Send one prompt and return the raw model reply
    async fn request_label(
        &self,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> std::result::Result<String, LabelError>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Map a non-success HTTP status to a label error
pub(crate) fn status_error(status: StatusCode, body: &str) -> LabelError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        LabelError::RateLimited
    } else {
        LabelError::Failed(format!("HTTP {} - {}", status, body.trim()))
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> LabelError {
    LabelError::Failed(format!("Label request failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            LabelError::RateLimited
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, " boom \n"),
            LabelError::Failed("HTTP 500 Internal Server Error - boom".to_string())
        );
    }
}
