//! Format detection and strategy dispatch

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{
    chatgpt_html, chatgpt_json, claude_json, claude_markdown, generic_json, generic_markdown,
    markers, ParseError,
};
use crate::types::ParsedConversation;

/// Extensions accepted for upload
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".json", ".html", ".htm", ".md", ".markdown", ".txt"];

/// Extraction strategy selected for an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// ChatGPT `conversations.json` entry with a node `mapping`
    ChatGptJson,
    /// ChatGPT HTML export
    ChatGptHtml,
    /// Claude JSON export with `chat_messages`
    ClaudeJson,
    /// Text with Human/Assistant role markers
    ClaudeMarkdown,
    /// `{title?, messages: [...]}` JSON
    GenericJson,
    /// Unstructured document, imported as one message
    GenericMarkdown,
}

impl Strategy {
    /// Run this strategy over raw content
    pub fn extract(
        self,
        content: &str,
        filename: Option<&str>,
    ) -> Result<ParsedConversation, ParseError> {
        let result = match self {
            Self::ChatGptJson => chatgpt_json::extract(content),
            Self::ChatGptHtml => chatgpt_html::extract(content),
            Self::ClaudeJson => claude_json::extract(content),
            Self::ClaudeMarkdown => claude_markdown::extract(content, filename),
            Self::GenericJson => generic_json::extract(content),
            Self::GenericMarkdown => generic_markdown::extract(content, filename),
        };

        result.map_err(|source| ParseError::Extraction {
            strategy: self,
            source,
        })
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ChatGptJson => "ChatGPT JSON",
            Self::ChatGptHtml => "ChatGPT HTML",
            Self::ClaudeJson => "Claude JSON",
            Self::ClaudeMarkdown => "Claude Markdown",
            Self::GenericJson => "generic JSON",
            Self::GenericMarkdown => "Markdown document",
        };
        f.write_str(name)
    }
}

/// Pick the extraction strategy for `content` uploaded as `filename`.
///
/// JSON is sniffed structurally first; content that is not valid JSON falls
/// through to extension-based detection.
pub fn detect_format(content: &str, filename: &str) -> Result<Strategy, ParseError> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(json) => return detect_json_schema(&json),
            Err(e) => {
                tracing::debug!("[{}] Not valid JSON ({}), checking extension", filename, e);
            }
        }
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => Ok(Strategy::ChatGptHtml),
        "md" | "markdown" | "txt" => {
            if markers::has_markers(content) {
                Ok(Strategy::ClaudeMarkdown)
            } else {
                Ok(Strategy::GenericMarkdown)
            }
        }
        _ => Err(ParseError::UnsupportedFormat {
            filename: filename.to_string(),
        }),
    }
}

fn detect_json_schema(json: &Value) -> Result<Strategy, ParseError> {
    if json.get("mapping").is_some_and(Value::is_object) {
        Ok(Strategy::ChatGptJson)
    } else if json.get("chat_messages").is_some_and(Value::is_array) {
        Ok(Strategy::ClaudeJson)
    } else if json.get("messages").is_some_and(Value::is_array) {
        Ok(Strategy::GenericJson)
    } else {
        Err(ParseError::UnrecognizedJsonSchema)
    }
}
