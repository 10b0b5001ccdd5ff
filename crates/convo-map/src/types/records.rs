//! Persisted conversation and message records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::{Role, SourceFormat, SourcePlatform};

/// A stored conversation, without its messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub title: String,
    pub source_platform: SourcePlatform,
    pub source_format: SourceFormat,
    pub original_filename: String,
    pub message_count: usize,
    pub first_message_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub imported_at: DateTime<Utc>,
}

/// A stored message with its (optional) topic label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    pub message_index: usize,
    pub timestamp: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub topic_generated_at: Option<DateTime<Utc>>,
}

/// Result of persisting a parsed conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportedConversation {
    pub conversation_id: Uuid,
    pub message_count: usize,
}
