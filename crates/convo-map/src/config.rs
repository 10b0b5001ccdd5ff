//! Configuration for the import and labeling service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "CONVO_MAP_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Labeling model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Topic labeling run configuration
    #[serde(default)]
    pub labeling: LabelingConfig,
    /// Persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config '{}': {}", path.display(), e)))
    }

    /// Load from the file named by `CONVO_MAP_CONFIG`, or fall back to defaults
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Which labeling model backend to talk to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAi,
}

/// Labeling model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub backend: LlmBackend,
    /// Base URL of the model server
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key (OpenAI-compatible backend)
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "phi3".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Topic labeling run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    /// Units labeled concurrently before the next batch starts
    pub batch_size: usize,
    /// Attempts per unit before the sentinel label is assigned
    pub max_attempts: u32,
    /// First rate-limit backoff delay; doubles on every attempt
    pub backoff_base_ms: u64,
    /// Characters of message content sent to the model
    pub max_prompt_chars: usize,
    /// Units selected per run when no explicit subset is given
    pub max_units_per_run: usize,
    /// Output token budget for a label
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_attempts: 3,
            backoff_base_ms: 1000,
            max_prompt_chars: 500,
            max_units_per_run: 100,
            max_output_tokens: 20,
            temperature: 0.3,
        }
    }
}

impl LabelingConfig {
    /// Backoff before retrying after a rate-limited attempt (0-based)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let database_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("convo-map")
            .join("conversations.db");

        Self { database_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let config = LabelingConfig::default();
        assert_eq!(config.backoff_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [llm]
            backend = "openai"
            base_url = "https://api.openai.com"
            model = "gpt-4o-mini"

            [labeling]
            batch_size = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.labeling.batch_size, 5);
        assert_eq!(config.labeling.max_attempts, 3);
        assert_eq!(config.server.port, 8080);
    }
}
