//! Canonical conversation schema produced by every extraction strategy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingestion::ExtractError;

/// Author of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Inverse of [`Role::as_str`]; unknown values become `User`
    pub fn from_db(value: &str) -> Self {
        match value {
            "assistant" => Self::Assistant,
            "system" => Self::System,
            _ => Self::User,
        }
    }
}

/// Platform the export came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourcePlatform {
    Chatgpt,
    Claude,
    Generic,
}

impl SourcePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chatgpt => "chatgpt",
            Self::Claude => "claude",
            Self::Generic => "generic",
        }
    }
}

/// Container format of the export
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Html,
    Markdown,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }
}

/// A single normalized message. Content is always trimmed and non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ParsedMessage {
    /// Build a message, returning `None` when the content is blank
    pub fn new(role: Role, content: &str, timestamp: Option<DateTime<Utc>>) -> Option<Self> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            role,
            content: content.to_string(),
            timestamp,
        })
    }
}

/// A normalized conversation ready for persistence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConversation {
    pub title: String,
    pub messages: Vec<ParsedMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    pub source_platform: SourcePlatform,
    pub source_format: SourceFormat,
}

impl ParsedConversation {
    /// Assemble a conversation, deriving time bounds from message timestamps.
    ///
    /// `title` falls back to `default_title` when blank. An empty message list
    /// is rejected with [`ExtractError::NoMessagesExtracted`].
    pub fn new(
        title: Option<&str>,
        default_title: &str,
        messages: Vec<ParsedMessage>,
        source_platform: SourcePlatform,
        source_format: SourceFormat,
    ) -> Result<Self, ExtractError> {
        if messages.is_empty() {
            return Err(ExtractError::NoMessagesExtracted);
        }

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(default_title)
            .to_string();

        let (first_message_at, last_message_at) = time_bounds(&messages);

        Ok(Self {
            title,
            messages,
            first_message_at,
            last_message_at,
            source_platform,
            source_format,
        })
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Min/max over the messages that carry a timestamp
fn time_bounds(messages: &[ParsedMessage]) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let mut stamps = messages.iter().filter_map(|m| m.timestamp);
    let Some(first) = stamps.next() else {
        return (None, None);
    };
    let (min, max) = stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
    (Some(min), Some(max))
}
