//! Unstructured text imported as a single assistant message

use super::{document_title, ExtractError};
use crate::types::{ParsedConversation, ParsedMessage, Role, SourceFormat, SourcePlatform};

const DEFAULT_TITLE: &str = "Imported Document";

pub(super) fn extract(
    content: &str,
    filename: Option<&str>,
) -> Result<ParsedConversation, ExtractError> {
    let messages: Vec<ParsedMessage> = ParsedMessage::new(Role::Assistant, content, None)
        .into_iter()
        .collect();

    let title = document_title(content, filename, DEFAULT_TITLE);
    ParsedConversation::new(
        Some(&title),
        DEFAULT_TITLE,
        messages,
        SourcePlatform::Generic,
        SourceFormat::Markdown,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_document() {
        let doc = "\n# Deployment notes\n\nRun the migration first.\n";
        let conv = extract(doc, Some("deploy.md")).unwrap();
        assert_eq!(conv.title, "Deployment notes");
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].role, Role::Assistant);
        assert_eq!(conv.messages[0].content, "# Deployment notes\n\nRun the migration first.");
        assert_eq!(conv.source_platform, SourcePlatform::Generic);
        assert_eq!(conv.source_format, SourceFormat::Markdown);
    }

    #[test]
    fn test_title_from_filename() {
        let conv = extract("plain words", Some("ideas.txt")).unwrap();
        assert_eq!(conv.title, "ideas");
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(extract(" \n ", None), Err(ExtractError::NoMessagesExtracted)));
    }
}
