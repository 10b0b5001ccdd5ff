//! Claude JSON export with a flat `chat_messages` array

use serde::Deserialize;
use serde_json::Value;

use super::timestamps::resolve_timestamp;
use super::{lenient, ExtractError};
use crate::types::{ParsedConversation, ParsedMessage, Role, SourceFormat, SourcePlatform};

const DEFAULT_TITLE: &str = "Untitled Conversation";

#[derive(Deserialize)]
struct ClaudeExport {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    chat_messages: Vec<Value>,
}

#[derive(Deserialize)]
struct ClaudeChatMessage {
    #[serde(default, deserialize_with = "lenient")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    sender: Option<String>,
    #[serde(default)]
    created_at: Option<Value>,
}

pub(super) fn extract(content: &str) -> Result<ParsedConversation, ExtractError> {
    let export: ClaudeExport = serde_json::from_str(content)?;

    let messages = export
        .chat_messages
        .iter()
        .filter_map(|entry| ClaudeChatMessage::deserialize(entry).ok())
        .filter_map(|m| {
            let role = match m.sender.as_deref() {
                Some("assistant") => Role::Assistant,
                _ => Role::User,
            };
            let timestamp = m.created_at.as_ref().and_then(resolve_timestamp);
            ParsedMessage::new(role, m.text.as_deref().unwrap_or_default(), timestamp)
        })
        .collect();

    ParsedConversation::new(
        export.name.as_deref(),
        DEFAULT_TITLE,
        messages,
        SourcePlatform::Claude,
        SourceFormat::Json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_messages() {
        let content = r#"{
            "uuid": "c1",
            "name": "Garden layout",
            "chat_messages": [
                {"uuid": "m1", "text": "Where should tomatoes go?", "sender": "human",
                 "created_at": "2024-05-01T09:00:00.000000Z"},
                {"uuid": "m2", "text": "  ", "sender": "assistant"},
                {"uuid": "m3", "text": "Full sun, south side.", "sender": "assistant",
                 "created_at": "2024-05-01T09:00:05Z"},
                {"uuid": "m4", "text": "thanks", "sender": "someone-else", "created_at": "garbage"}
            ]
        }"#;

        let conv = extract(content).unwrap();
        assert_eq!(conv.title, "Garden layout");
        let roles: Vec<_> = conv.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert!(conv.messages[2].timestamp.is_none());
        assert_eq!(conv.last_message_at.unwrap().to_rfc3339(), "2024-05-01T09:00:05+00:00");
        assert_eq!(conv.source_platform, SourcePlatform::Claude);
    }

    #[test]
    fn test_all_empty() {
        let content = r#"{"name": "x", "chat_messages": [{"text": "", "sender": "human"}]}"#;
        assert!(matches!(extract(content), Err(ExtractError::NoMessagesExtracted)));
    }

    #[test]
    fn test_loosely_typed_entries() {
        let content = r#"{
            "name": 7,
            "chat_messages": [
                {"text": "hi", "sender": "human", "created_at": 1700000000},
                {"text": "hello", "sender": "assistant", "created_at": {"weird": true}},
                {"text": "odd sender", "sender": null},
                {"text": 5, "sender": "human"},
                "not an object"
            ]
        }"#;

        let conv = extract(content).unwrap();
        assert_eq!(conv.title, DEFAULT_TITLE);
        assert_eq!(conv.messages.len(), 3);
        assert_eq!(conv.messages[0].timestamp.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(conv.messages[1].role, Role::Assistant);
        assert!(conv.messages[1].timestamp.is_none());
        assert_eq!(conv.messages[2].role, Role::User);
    }
}
