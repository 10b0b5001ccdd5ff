//! Batched topic labeling run
//!
//! A run labels units in fixed-size batches. Requests inside a batch run
//! concurrently on one task; the next batch starts only after every unit of
//! the current one has a label or the sentinel. Events go out through a
//! bounded channel and a closed channel abandons the run.

use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::config::LabelingConfig;
use crate::error::{Error, Result};
use crate::providers::{LabelError, LabelProvider, LabelStore};
use crate::types::{LabelingUnit, ProgressEvent, RunStatus, SENTINEL_LABEL};

use super::prompt::PromptBuilder;

/// Message carried by the terminal error event
pub const RUN_FAILED_MESSAGE: &str = "Failed to generate topics";

const EVENT_BUFFER: usize = 16;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every batch finished; `labeled` includes sentinel labels
    Complete { labeled: usize },
    /// A store fault stopped the run
    Failed { processed: usize, reason: String },
    /// The event consumer went away
    Abandoned { processed: usize },
}

/// Drives labeling runs against a model and a store
#[derive(Clone)]
pub struct TopicLabeler {
    provider: Arc<dyn LabelProvider>,
    store: Arc<dyn LabelStore>,
    config: LabelingConfig,
}

impl TopicLabeler {
    pub fn new(
        provider: Arc<dyn LabelProvider>,
        store: Arc<dyn LabelStore>,
        config: LabelingConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Spawn a run and return its event stream
    pub fn start(
        &self,
        conversation_id: Uuid,
        message_ids: Option<Vec<Uuid>>,
    ) -> ReceiverStream<ProgressEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let labeler = self.clone();

        tokio::spawn(async move {
            let outcome = labeler.run(conversation_id, message_ids.as_deref(), tx).await;
            tracing::debug!("[{}] Labeling run ended: {:?}", conversation_id, outcome);
        });

        ReceiverStream::new(rx)
    }

    /// Label the conversation's unlabeled messages, pushing events into `events`
    pub async fn run(
        &self,
        conversation_id: Uuid,
        message_ids: Option<&[Uuid]>,
        events: mpsc::Sender<ProgressEvent>,
    ) -> RunOutcome {
        let units = match self
            .store
            .fetch_unlabeled_units(conversation_id, message_ids, self.config.max_units_per_run)
            .await
        {
            Ok(units) => units,
            Err(e) => return self.fail(None, 0, e, &events).await,
        };

        let total = units.len();
        let run_id = match self.store.create_run(conversation_id, total).await {
            Ok(id) => id,
            Err(e) => return self.fail(None, 0, e, &events).await,
        };

        tracing::info!(
            "[{}] Labeling {} messages in batches of {} (run {})",
            conversation_id,
            total,
            self.config.batch_size,
            run_id
        );

        let mut processed = 0;
        for batch in units.chunks(self.config.batch_size.max(1)) {
            if events.is_closed() {
                return self.abandon(run_id, processed).await;
            }

            let results = join_all(batch.iter().map(|unit| self.label_and_store(unit))).await;
            processed += batch.len();

            if let Some(err) = results.into_iter().find_map(|r| r.err()) {
                return self.fail(Some(run_id), processed, err, &events).await;
            }
            if let Err(e) = self.store.record_progress(run_id, processed).await {
                return self.fail(Some(run_id), processed, e, &events).await;
            }

            let progress = ProgressEvent::Progress {
                current: processed,
                total,
            };
            if events.send(progress).await.is_err() {
                return self.abandon(run_id, processed).await;
            }
        }

        if let Err(e) = self.store.finish_run(run_id, RunStatus::Complete, None).await {
            tracing::warn!("[{}] Failed to close run record: {}", run_id, e);
        }
        tracing::info!("[{}] Labeled {} messages", conversation_id, processed);

        if events
            .send(ProgressEvent::Complete {
                total_labeled: processed,
            })
            .await
            .is_err()
        {
            tracing::debug!("[{}] Consumer left before completion event", run_id);
        }

        RunOutcome::Complete { labeled: processed }
    }

    async fn label_and_store(&self, unit: &LabelingUnit) -> Result<()> {
        let label = self.label_unit(unit).await;
        self.store.write_label(unit.id, &label, Utc::now()).await
    }

    /// Bounded retry loop; never fails, falls back to the sentinel label
    async fn label_unit(&self, unit: &LabelingUnit) -> String {
        let prompt = PromptBuilder::build_topic_prompt(&unit.content, self.config.max_prompt_chars);
        let attempts = self.config.max_attempts.max(1);

        for attempt in 0..attempts {
            let result = self
                .provider
                .request_label(&prompt, self.config.max_output_tokens, self.config.temperature)
                .await
                .and_then(|raw| {
                    let label = PromptBuilder::clean_label(&raw);
                    if label.is_empty() {
                        Err(LabelError::Failed("empty label".to_string()))
                    } else {
                        Ok(label)
                    }
                });

            match result {
                Ok(label) => return label,
                Err(LabelError::RateLimited) if attempt + 1 < attempts => {
                    let delay = self.config.backoff_for_attempt(attempt);
                    tracing::warn!(
                        "[{}] Rate limited (attempt {}/{}), retrying in {:?}",
                        unit.id,
                        attempt + 1,
                        attempts,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        "[{}] Label request failed (attempt {}/{}): {}",
                        unit.id,
                        attempt + 1,
                        attempts,
                        e
                    );
                }
            }
        }

        tracing::warn!("[{}] Attempts exhausted, assigning sentinel label", unit.id);
        SENTINEL_LABEL.to_string()
    }

    async fn fail(
        &self,
        run_id: Option<Uuid>,
        processed: usize,
        err: Error,
        events: &mpsc::Sender<ProgressEvent>,
    ) -> RunOutcome {
        let reason = err.to_string();
        tracing::error!("Labeling run failed after {} messages: {}", processed, reason);

        if let Some(run_id) = run_id {
            if let Err(e) = self
                .store
                .finish_run(run_id, RunStatus::Failed, Some(&reason))
                .await
            {
                tracing::warn!("[{}] Failed to close run record: {}", run_id, e);
            }
        }

        let event = ProgressEvent::Error {
            error: RUN_FAILED_MESSAGE.to_string(),
        };
        if events.send(event).await.is_err() {
            tracing::debug!("Consumer left before error event");
        }

        RunOutcome::Failed { processed, reason }
    }

    async fn abandon(&self, run_id: Uuid, processed: usize) -> RunOutcome {
        tracing::info!(
            "[{}] Consumer disconnected, abandoning run after {} messages",
            run_id,
            processed
        );
        if let Err(e) = self
            .store
            .finish_run(run_id, RunStatus::Abandoned, None)
            .await
        {
            tracing::warn!("[{}] Failed to close run record: {}", run_id, e);
        }
        RunOutcome::Abandoned { processed }
    }
}
