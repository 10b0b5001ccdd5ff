//! Persistence seam used by the topic labeling orchestrator

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{LabelingUnit, RunStatus};

/// Store operations a labeling run depends on
///
/// Implementations:
/// - `ConversationDb`: SQLite persistence
#[async_trait]
pub trait LabelStore: Send + Sync {
    /// Messages of a conversation that have no topic yet, in message order.
    /// A non-empty `ids_filter` restricts the selection to those message ids.
    async fn fetch_unlabeled_units(
        &self,
        conversation_id: Uuid,
        ids_filter: Option<&[Uuid]>,
        limit: usize,
    ) -> Result<Vec<LabelingUnit>>;

    /// Persist a label for one message
    async fn write_label(&self, unit_id: Uuid, label: &str, labeled_at: DateTime<Utc>) -> Result<()>;

    /// Open a run record and return its id
    async fn create_run(&self, conversation_id: Uuid, total: usize) -> Result<Uuid>;

    /// Persist the number of units processed so far
    async fn record_progress(&self, run_id: Uuid, processed: usize) -> Result<()>;

    /// Close a run record
    async fn finish_run(&self, run_id: Uuid, status: RunStatus, error: Option<&str>) -> Result<()>;
}
