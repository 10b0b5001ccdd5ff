//! Generic `{title?, messages: [{role, content, timestamp?}]}` JSON

use serde::Deserialize;
use serde_json::Value;

use super::timestamps::resolve_timestamp;
use super::ExtractError;
use crate::types::{ParsedConversation, ParsedMessage, Role, SourceFormat, SourcePlatform};

const DEFAULT_TITLE: &str = "Imported Conversation";

#[derive(Deserialize)]
struct GenericExport {
    #[serde(default)]
    title: Option<String>,
    messages: Vec<Value>,
}

#[derive(Deserialize)]
struct GenericMessage {
    role: String,
    content: String,
    #[serde(default)]
    timestamp: Option<Value>,
}

fn map_role(role: &str) -> Role {
    match role.to_lowercase().as_str() {
        "assistant" | "bot" | "ai" => Role::Assistant,
        "system" => Role::System,
        _ => Role::User,
    }
}

pub(super) fn extract(content: &str) -> Result<ParsedConversation, ExtractError> {
    let export: GenericExport = serde_json::from_str(content)?;

    let messages = export
        .messages
        .iter()
        // entries without a string role and content are skipped, not fatal
        .filter_map(|entry| GenericMessage::deserialize(entry).ok())
        .filter_map(|m| {
            let timestamp = m.timestamp.as_ref().and_then(resolve_timestamp);
            ParsedMessage::new(map_role(&m.role), &m.content, timestamp)
        })
        .collect();

    ParsedConversation::new(
        export.title.as_deref(),
        DEFAULT_TITLE,
        messages,
        SourcePlatform::Generic,
        SourceFormat::Json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_and_skips() {
        let content = r#"{
            "title": "Support chat",
            "messages": [
                {"role": "User", "content": "My order is late"},
                {"role": "BOT", "content": "Sorry to hear that"},
                {"role": "ai", "content": "Checking now"},
                {"role": "System", "content": "Escalated"},
                {"role": "customer", "content": "ok"},
                {"content": "no role"},
                {"role": "user"},
                {"role": "user", "content": 42},
                "not an object"
            ]
        }"#;

        let conv = extract(content).unwrap();
        assert_eq!(conv.title, "Support chat");
        let roles: Vec<_> = conv.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Assistant, Role::System, Role::User]
        );
    }

    #[test]
    fn test_second_and_millisecond_timestamps_agree() {
        let content = r#"{"messages": [
            {"role": "user", "content": "a", "timestamp": 1700000000},
            {"role": "assistant", "content": "b", "timestamp": 1700000000000}
        ]}"#;
        let conv = extract(content).unwrap();
        assert_eq!(conv.messages[0].timestamp, conv.messages[1].timestamp);
        assert_eq!(conv.first_message_at, conv.last_message_at);
        assert_eq!(conv.first_message_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(conv.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_string_timestamps() {
        let content = r#"{"messages": [
            {"role": "user", "content": "a", "timestamp": "2024-02-10T08:00:00Z"},
            {"role": "user", "content": "b", "timestamp": "not a date"}
        ]}"#;
        let conv = extract(content).unwrap();
        assert!(conv.messages[0].timestamp.is_some());
        assert!(conv.messages[1].timestamp.is_none());
        assert_eq!(conv.first_message_at, conv.messages[0].timestamp);
    }

    #[test]
    fn test_mistyped_timestamp_keeps_message() {
        let content = r#"{"messages": [
            {"role": "user", "content": "kept", "timestamp": true},
            {"role": "assistant", "content": "also kept", "timestamp": {"t": 1}},
            {"role": "user", "content": "null time", "timestamp": null}
        ]}"#;
        let conv = extract(content).unwrap();
        assert_eq!(conv.messages.len(), 3);
        assert_eq!(conv.messages[1].content, "also kept");
        assert!(conv.messages.iter().all(|m| m.timestamp.is_none()));
        assert!(conv.first_message_at.is_none());
    }

    #[test]
    fn test_nothing_usable() {
        let content = r#"{"messages": [{"role": "user", "content": "   "}, {"foo": 1}]}"#;
        assert!(matches!(extract(content), Err(ExtractError::NoMessagesExtracted)));
    }
}
