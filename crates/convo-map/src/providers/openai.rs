//! OpenAI-compatible chat completions labeler

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::labeler::{status_error, transport_error, LabelError, LabelProvider};

/// Labeler backed by `/v1/chat/completions`
pub struct OpenAiLabeler {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiLabeler {
    /// Create a labeler, reading the API key from `config.api_key_env`
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("API key not configured (set {})", config.api_key_env))
            })?;

        Self::with_api_key(config, api_key)
    }

    /// Create a labeler with an explicit API key
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl LabelProvider for OpenAiLabeler {
    async fn request_label(
        &self,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> std::result::Result<String, LabelError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: max_output_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LabelError::Failed(format!("Failed to parse completion response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LabelError::Failed("Completion had no content".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-4o-mini");
                assert_eq!(body["max_tokens"], 20);
                assert_eq!(body["messages"][0]["role"], "user");
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "\"Rust Lifetimes\"" } }]
                }))
            }),
        );
        let labeler = OpenAiLabeler::with_api_key(&config(serve(router).await), "sk-test").unwrap();

        let label = labeler.request_label("prompt", 20, 0.3).await.unwrap();
        assert_eq!(label, "\"Rust Lifetimes\"");
    }

    #[tokio::test]
    async fn test_rate_limited_and_empty() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limit") }),
        );
        let labeler = OpenAiLabeler::with_api_key(&config(serve(router).await), "k").unwrap();
        assert_eq!(labeler.request_label("p", 20, 0.3).await, Err(LabelError::RateLimited));

        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let labeler = OpenAiLabeler::with_api_key(&config(serve(router).await), "k").unwrap();
        assert!(matches!(
            labeler.request_label("p", 20, 0.3).await,
            Err(LabelError::Failed(_))
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: "CONVO_MAP_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(OpenAiLabeler::new(&config), Err(Error::Config(_))));
    }
}
