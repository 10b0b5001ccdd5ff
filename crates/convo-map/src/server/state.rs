//! Application state for the convo-map server

use std::sync::Arc;

use crate::config::{AppConfig, LlmBackend};
use crate::error::Result;
use crate::labeling::TopicLabeler;
use crate::providers::{LabelProvider, OllamaLabeler, OpenAiLabeler};
use crate::storage::ConversationDb;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Conversation store
    db: ConversationDb,
    /// Labeling model (Ollama or OpenAI-compatible)
    label_provider: Arc<dyn LabelProvider>,
    /// Labeling run driver
    labeler: TopicLabeler,
}

impl AppState {
    /// Create new application state
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!(
            "Initializing convo-map state (labeling backend: {:?})...",
            config.llm.backend
        );

        let db = ConversationDb::new(&config.storage.database_path)?;
        tracing::info!("Database opened at {}", config.storage.database_path.display());

        let label_provider: Arc<dyn LabelProvider> = match config.llm.backend {
            LlmBackend::Ollama => {
                tracing::info!("Using Ollama at {} ({})", config.llm.base_url, config.llm.model);
                Arc::new(OllamaLabeler::new(&config.llm)?)
            }
            LlmBackend::OpenAi => {
                tracing::info!(
                    "Using OpenAI-compatible API at {} ({})",
                    config.llm.base_url,
                    config.llm.model
                );
                Arc::new(OpenAiLabeler::new(&config.llm)?)
            }
        };

        if !label_provider.health_check().await.unwrap_or(false) {
            tracing::warn!(
                "Labeling backend '{}' is not reachable; topic generation will fall back to placeholders",
                label_provider.name()
            );
        }

        Ok(Self::from_parts(config, db, label_provider))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: AppConfig,
        db: ConversationDb,
        label_provider: Arc<dyn LabelProvider>,
    ) -> Self {
        let labeler = TopicLabeler::new(
            Arc::clone(&label_provider),
            Arc::new(db.clone()),
            config.labeling.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                label_provider,
                labeler,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the conversation store
    pub fn db(&self) -> &ConversationDb {
        &self.inner.db
    }

    /// Get the labeling model
    pub fn label_provider(&self) -> &Arc<dyn LabelProvider> {
        &self.inner.label_provider
    }

    /// Get the labeling run driver
    pub fn labeler(&self) -> &TopicLabeler {
        &self.inner.labeler
    }
}
