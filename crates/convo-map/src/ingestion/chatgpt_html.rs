//! ChatGPT HTML export
//!
//! Message elements are located by trying selectors in order; the first
//! selector with any match wins and later ones are not consulted.

use super::ExtractError;
use crate::types::ParsedConversation;

#[cfg(feature = "html")]
use crate::types::{ParsedMessage, Role, SourceFormat, SourcePlatform};

#[cfg(feature = "html")]
const DEFAULT_TITLE: &str = "Imported Conversation";

#[cfg(feature = "html")]
const MESSAGE_SELECTORS: &[&str] = &[
    ".conversation-turn",
    ".message",
    "[data-role]",
    ".user-message, .assistant-message",
    r#"div[class*="message"]"#,
];

#[cfg(feature = "html")]
pub(super) fn extract(content: &str) -> Result<ParsedConversation, ExtractError> {
    use scraper::{ElementRef, Html, Selector};

    let document = Html::parse_document(content);

    let title = ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        let text: String = document.select(&selector).next()?.text().collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    });

    let elements: Vec<ElementRef> = MESSAGE_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .map(|selector| document.select(&selector).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .ok_or(ExtractError::NoMessagesFound)?;

    let messages: Vec<ParsedMessage> = elements
        .iter()
        .filter_map(|element| {
            let text: String = element.text().collect();
            let timestamp = element
                .value()
                .attr("data-timestamp")
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .and_then(super::timestamps::from_epoch_seconds);
            ParsedMessage::new(element_role(element), &text, timestamp)
        })
        .collect();

    if messages.is_empty() {
        return Err(ExtractError::NoMessagesFound);
    }

    ParsedConversation::new(
        title.as_deref(),
        DEFAULT_TITLE,
        messages,
        SourcePlatform::Chatgpt,
        SourceFormat::Html,
    )
}

/// Explicit `data-role` first, then class-name substrings, default user
#[cfg(feature = "html")]
fn element_role(element: &scraper::ElementRef) -> Role {
    let value = element.value();

    match value.attr("data-role").map(|r| r.trim().to_lowercase()).as_deref() {
        Some("assistant") => return Role::Assistant,
        Some("system") => return Role::System,
        Some("user") => return Role::User,
        _ => {}
    }

    let classes = value.attr("class").unwrap_or_default().to_lowercase();
    if classes.contains("assistant") {
        Role::Assistant
    } else if classes.contains("system") {
        Role::System
    } else {
        Role::User
    }
}

#[cfg(not(feature = "html"))]
pub(super) fn extract(_content: &str) -> Result<ParsedConversation, ExtractError> {
    Err(ExtractError::HtmlParsingUnsupported)
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_turns() {
        let html = r#"<html><head><title> Weekend plans </title></head><body>
            <h1>Ignored heading</h1>
            <div class="conversation-turn user" data-timestamp="1700000000"><p>Any hikes nearby?</p></div>
            <div class="conversation-turn assistant" data-timestamp="1700000060">
                <p>Try the <b>ridge</b> trail.</p>
            </div>
            <div class="conversation-turn">   </div>
        </body></html>"#;

        let conv = extract(html).unwrap();
        assert_eq!(conv.title, "Weekend plans");
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].role, Role::User);
        assert_eq!(conv.messages[0].content, "Any hikes nearby?");
        assert_eq!(conv.messages[1].role, Role::Assistant);
        assert_eq!(conv.messages[1].content, "Try the ridge trail.");
        assert_eq!(conv.first_message_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(conv.last_message_at.unwrap().timestamp(), 1_700_000_060);
        assert_eq!(conv.source_format, SourceFormat::Html);
    }

    #[test]
    fn test_role_attribute_beats_class() {
        let html = r#"<body><h1>Chat</h1>
            <div data-role="system" class="assistant">Be terse.</div>
            <div data-role="assistant">Ok.</div>
            <div data-role="other">hm</div>
        </body>"#;

        let conv = extract(html).unwrap();
        assert_eq!(conv.title, "Chat");
        let roles: Vec<_> = conv.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::User]);
    }

    #[test]
    fn test_first_selector_wins() {
        let html = r#"<body>
            <div class="message assistant">from .message</div>
            <div class="user-message">only matched by a later selector</div>
        </body>"#;
        let conv = extract(html).unwrap();
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].content, "from .message");
        assert_eq!(conv.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_no_messages() {
        let err = extract("<html><body><p>nothing here</p></body></html>").unwrap_err();
        assert!(matches!(err, ExtractError::NoMessagesFound));

        let err = extract(r#"<div class="message">  </div>"#).unwrap_err();
        assert!(matches!(err, ExtractError::NoMessagesFound));
    }
}
