//! Core types for conversation import and topic labeling

pub mod conversation;
pub mod labeling;
pub mod records;

pub use conversation::{ParsedConversation, ParsedMessage, Role, SourceFormat, SourcePlatform};
pub use labeling::{LabelingUnit, ProgressEvent, RunStatus, TopicCount, SENTINEL_LABEL};
pub use records::{ConversationRecord, ImportedConversation, MessageRecord};
