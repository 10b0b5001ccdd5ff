//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for conversations, messages, topic
//! labels and labeling runs.

mod database;

pub use database::{ConversationDb, ConversationPage};
