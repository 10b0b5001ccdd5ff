//! Topic labeling run types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label assigned when every attempt for a unit failed
pub const SENTINEL_LABEL: &str = "[Topic unavailable]";

/// A persisted message awaiting a topic label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelingUnit {
    pub id: Uuid,
    pub content: String,
}

/// Event pushed to the consumer of a labeling run.
///
/// A run emits any number of `Progress` events followed by exactly one
/// `Complete` or `Error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress {
        current: usize,
        total: usize,
    },
    Complete {
        #[serde(rename = "topics_generated")]
        total_labeled: usize,
    },
    Error {
        error: String,
    },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Persisted status of a labeling run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Complete,
    Failed,
    Abandoned,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }
}

/// How often a label occurs in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}
