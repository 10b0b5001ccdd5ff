//! Chat-export ingestion: format detection and per-format extraction

mod chatgpt_html;
mod chatgpt_json;
mod claude_json;
mod claude_markdown;
mod detect;
mod generic_json;
mod generic_markdown;
pub mod markers;
mod timestamps;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::types::ParsedConversation;

pub use detect::{detect_format, Strategy, ACCEPTED_EXTENSIONS};
pub use markers::{find_markers, MarkerMatch, MarkerSyntax};

/// Why a single strategy could not produce a conversation
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("No messages found. The file may not be a valid export.")]
    NoMessagesFound,

    #[error("No valid messages could be extracted")]
    NoMessagesExtracted,

    #[error("No message markers found")]
    NoMarkersFound,

    #[error("HTML parsing is not available in this build")]
    HtmlParsingUnsupported,
}

/// Import failure for one file; terminal for that import attempt
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(
        "Unsupported file format for '{filename}'. Please upload a ChatGPT or Claude export file ({})",
        ACCEPTED_EXTENSIONS.join(", ")
    )]
    UnsupportedFormat { filename: String },

    #[error("JSON file does not match any known format")]
    UnrecognizedJsonSchema,

    #[error("Failed to parse {strategy}: {source}")]
    Extraction {
        strategy: Strategy,
        #[source]
        source: ExtractError,
    },
}

/// Field deserializer that turns a present but mistyped value into `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Detect the export format and extract a normalized conversation
pub fn parse_conversation(content: &str, filename: &str) -> Result<ParsedConversation, ParseError> {
    let strategy = detect_format(content, filename)?;
    tracing::info!("[{}] Detected {}", filename, strategy);

    let conversation = strategy.extract(content, Some(filename))?;
    tracing::info!(
        "[{}] Extracted {} messages ({})",
        filename,
        conversation.message_count(),
        conversation.title
    );
    Ok(conversation)
}

/// Title for text documents: first level-1 heading that is not a role marker,
/// else the filename without its text extension, else `default`.
fn document_title(content: &str, filename: Option<&str>, default: &str) -> String {
    static HEADING: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t]*\r?$").expect("valid heading regex"));

    let heading = HEADING
        .captures_iter(content)
        .filter(|caps| markers::find_markers(&caps[0]).is_empty())
        .map(|caps| caps[1].trim().to_string())
        .find(|t| !t.is_empty());

    if let Some(title) = heading {
        return title;
    }

    filename
        .map(strip_text_extension)
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| default.to_string())
}

fn strip_text_extension(filename: &str) -> &str {
    if let Some((stem, ext)) = filename.rsplit_once('.') {
        if matches!(ext.to_lowercase().as_str(), "md" | "markdown" | "txt") {
            return stem;
        }
    }
    filename
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, SourcePlatform};

    #[test]
    fn test_title_skips_marker_headings() {
        let doc = "# Human\nhello\n# Trip planning\n";
        assert_eq!(document_title(doc, None, "d"), "Trip planning");
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(document_title("no headings", Some("notes.MD"), "d"), "notes");
        assert_eq!(document_title("no headings", Some("archive.tar"), "d"), "archive.tar");
        assert_eq!(document_title("no headings", None, "Default"), "Default");
    }

    #[test]
    fn test_parse_conversation_end_to_end() {
        let conv = parse_conversation("Human: hi\nAssistant: hello", "chat.txt").unwrap();
        assert_eq!(conv.source_platform, SourcePlatform::Claude);
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_errors_are_human_readable() {
        let err = parse_conversation("plain", "photo.png").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("photo.png"));
        assert!(text.contains(".json"));

        let err = parse_conversation(r#"{"chat_messages": []}"#, "c.json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to parse Claude JSON: No valid messages could be extracted"
        );
    }
}
