//! convo-map: chat-history import and LLM topic labeling
//!
//! Normalizes ChatGPT, Claude and generic chat exports (JSON, HTML, Markdown
//! and plain text) into one conversation schema, stores them in SQLite, and
//! labels each message with a short topic through a batched, rate-limit
//! aware run that streams its progress.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod labeling;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use ingestion::{detect_format, parse_conversation, ParseError, Strategy};
pub use labeling::{RunOutcome, TopicLabeler};
pub use storage::ConversationDb;
pub use types::{ParsedConversation, ParsedMessage, ProgressEvent, Role};
