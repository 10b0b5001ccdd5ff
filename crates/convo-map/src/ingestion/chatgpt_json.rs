//! ChatGPT JSON export: a node-id keyed message graph
//!
//! Each entry of `mapping` optionally carries a message and lists child node
//! ids. Exports are expected to form a tree but this is never trusted: the
//! walk keeps a visited set and skips child ids with no node.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use super::timestamps::from_epoch_seconds;
use super::{lenient, ExtractError};
use crate::types::{ParsedConversation, ParsedMessage, Role, SourceFormat, SourcePlatform};

const DEFAULT_TITLE: &str = "Untitled Conversation";

#[derive(Deserialize)]
struct ChatGptExport {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    mapping: Map<String, Value>,
}

#[derive(Deserialize, Default)]
struct ChatGptNode {
    #[serde(default, deserialize_with = "lenient")]
    message: Option<ChatGptMessage>,
    #[serde(default, deserialize_with = "lenient")]
    children: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ChatGptMessage {
    #[serde(default, deserialize_with = "lenient")]
    author: Option<ChatGptAuthor>,
    #[serde(default, deserialize_with = "lenient")]
    content: Option<ChatGptContent>,
    #[serde(default, deserialize_with = "lenient")]
    create_time: Option<f64>,
}

#[derive(Deserialize)]
struct ChatGptAuthor {
    #[serde(default, deserialize_with = "lenient")]
    role: Option<String>,
}

#[derive(Deserialize)]
struct ChatGptContent {
    #[serde(default, deserialize_with = "lenient")]
    parts: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    text: Option<String>,
}

impl ChatGptNode {
    fn children(&self) -> &[String] {
        self.children.as_deref().unwrap_or_default()
    }
}

impl ChatGptContent {
    /// String parts concatenated; attachment objects are ignored
    fn text(&self) -> String {
        let joined: String = self
            .parts
            .iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        if joined.trim().is_empty() {
            self.text.clone().unwrap_or_default()
        } else {
            joined
        }
    }
}

fn map_role(role: &str) -> Role {
    match role {
        "assistant" => Role::Assistant,
        "system" => Role::System,
        _ => Role::User,
    }
}

pub(super) fn extract(content: &str) -> Result<ParsedConversation, ExtractError> {
    let export: ChatGptExport = serde_json::from_str(content)?;

    // Keys keep document order, so the fallback root is stable
    let order: Vec<&str> = export.mapping.keys().map(String::as_str).collect();
    let nodes: HashMap<&str, ChatGptNode> = export
        .mapping
        .iter()
        .map(|(id, value)| {
            let node = ChatGptNode::deserialize(value).unwrap_or_else(|e| {
                tracing::debug!("Skipping malformed node {}: {}", id, e);
                ChatGptNode::default()
            });
            (id.as_str(), node)
        })
        .collect();

    let messages = match find_root(&order, &nodes) {
        Some(root) => walk(root, &nodes),
        None => Vec::new(),
    };

    ParsedConversation::new(
        export.title.as_deref(),
        DEFAULT_TITLE,
        messages,
        SourcePlatform::Chatgpt,
        SourceFormat::Json,
    )
}

/// The first node with children but no message, else the first key
fn find_root<'a>(order: &[&'a str], nodes: &HashMap<&str, ChatGptNode>) -> Option<&'a str> {
    order
        .iter()
        .copied()
        .find(|id| {
            nodes
                .get(id)
                .is_some_and(|n| n.message.is_none() && !n.children().is_empty())
        })
        .or_else(|| order.first().copied())
}

/// Depth-first pre-order walk, each node visited at most once
fn walk(root: &str, nodes: &HashMap<&str, ChatGptNode>) -> Vec<ParsedMessage> {
    let mut messages = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![root];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = nodes.get(id) else {
            tracing::debug!("Skipping unresolved child id {}", id);
            continue;
        };

        if let Some(message) = node_message(node) {
            messages.push(message);
        }

        for child in node.children().iter().rev() {
            if !visited.contains(child.as_str()) {
                stack.push(child.as_str());
            }
        }
    }

    messages
}

fn node_message(node: &ChatGptNode) -> Option<ParsedMessage> {
    let message = node.message.as_ref()?;
    let text = message.content.as_ref()?.text();
    let role = message
        .author
        .as_ref()
        .and_then(|a| a.role.as_deref())
        .map_or(Role::User, map_role);
    let timestamp = message.create_time.and_then(from_epoch_seconds);

    ParsedMessage::new(role, &text, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(role: &str, text: &str, children: &[&str]) -> Value {
        json!({
            "message": {
                "author": {"role": role},
                "content": {"parts": [text]},
            },
            "children": children,
        })
    }

    #[test]
    fn test_tree_in_visit_order() {
        let export = json!({
            "title": "Rust questions",
            "mapping": {
                "root": {"message": null, "children": ["sys"]},
                "sys": node("system", "", &["u1"]),
                "u1": {
                    "message": {
                        "author": {"role": "user"},
                        "content": {"parts": ["  How do lifetimes work? "]},
                        "create_time": 1_700_000_100.0
                    },
                    "children": ["a1"]
                },
                "a1": {
                    "message": {
                        "author": {"role": "assistant"},
                        "content": {"parts": ["They ", "track borrows."]},
                        "create_time": 1_700_000_000.5
                    },
                    "children": []
                }
            }
        });

        let conv = extract(&export.to_string()).unwrap();
        assert_eq!(conv.title, "Rust questions");
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].role, Role::User);
        assert_eq!(conv.messages[0].content, "How do lifetimes work?");
        assert_eq!(conv.messages[1].content, "They track borrows.");
        assert_eq!(conv.first_message_at.unwrap().timestamp_millis(), 1_700_000_000_500);
        assert_eq!(conv.last_message_at.unwrap().timestamp(), 1_700_000_100);
        assert_eq!(conv.source_platform, SourcePlatform::Chatgpt);
    }

    #[test]
    fn test_branches_depth_first() {
        let export = json!({
            "mapping": {
                "r": {"children": ["a", "b"]},
                "a": node("user", "first", &["a2"]),
                "a2": node("assistant", "first reply", &[]),
                "b": node("user", "second", &[]),
            }
        });
        let conv = extract(&export.to_string()).unwrap();
        let texts: Vec<_> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["first", "first reply", "second"]);
        assert_eq!(conv.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_cycle_terminates() {
        let export = json!({
            "mapping": {
                "r": {"children": ["a"]},
                "a": node("user", "loop start", &["b"]),
                "b": node("assistant", "loop back", &["a", "missing"]),
            }
        });
        let conv = extract(&export.to_string()).unwrap();
        assert_eq!(conv.messages.len(), 2);
    }

    #[test]
    fn test_fallback_root_is_first_key() {
        let export = json!({
            "mapping": {
                "z": node("user", "from z", &["y"]),
                "y": node("assistant", "from y", &[]),
                "x": node("user", "orphan", &[]),
            }
        });
        let conv = extract(&export.to_string()).unwrap();
        let texts: Vec<_> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["from z", "from y"]);
    }

    #[test]
    fn test_unknown_roles_and_attachments() {
        let export = json!({
            "mapping": {
                "r": {"children": ["t"]},
                "t": {
                    "message": {
                        "author": {"role": "tool"},
                        "content": {"parts": [{"asset_pointer": "file://x"}, "result"]}
                    },
                    "children": null
                }
            }
        });
        let conv = extract(&export.to_string()).unwrap();
        assert_eq!(conv.messages[0].role, Role::User);
        assert_eq!(conv.messages[0].content, "result");
        assert!(conv.first_message_at.is_none());
    }

    #[test]
    fn test_mistyped_message_keeps_descendants() {
        let export = json!({
            "mapping": {
                "root": {"message": null, "children": ["a"]},
                "a": {
                    "message": {
                        "author": {"role": null},
                        "content": {"parts": null},
                        "create_time": "soon"
                    },
                    "children": ["b"]
                },
                "b": node("user", "q", &["c"]),
                "c": node("assistant", "a", &[]),
            }
        });
        let conv = extract(&export.to_string()).unwrap();
        let texts: Vec<_> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["q", "a"]);
        assert_eq!(conv.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_empty_mapping() {
        let err = extract(r#"{"mapping": {}}"#).unwrap_err();
        assert!(matches!(err, ExtractError::NoMessagesExtracted));
    }

    #[test]
    fn test_missing_mapping_is_invalid() {
        assert!(matches!(extract(r#"{"title": "x"}"#), Err(ExtractError::InvalidJson(_))));
    }
}
