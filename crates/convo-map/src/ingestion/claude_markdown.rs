//! Conversation text segmented by role markers

use super::markers::find_markers;
use super::{document_title, ExtractError};
use crate::types::{ParsedConversation, ParsedMessage, SourceFormat, SourcePlatform};

const DEFAULT_TITLE: &str = "Imported Conversation";

/// Each marker opens a message that runs until the next marker (or the end
/// of the document). Overlapping markers yield empty spans, which are dropped.
pub(super) fn extract(
    content: &str,
    filename: Option<&str>,
) -> Result<ParsedConversation, ExtractError> {
    let markers = find_markers(content);
    if markers.is_empty() {
        return Err(ExtractError::NoMarkersFound);
    }

    let messages = markers
        .iter()
        .enumerate()
        .filter_map(|(i, marker)| {
            let end = markers.get(i + 1).map_or(content.len(), |next| next.position);
            let start = marker.end.min(end);
            ParsedMessage::new(marker.role, &content[start..end], None)
        })
        .collect();

    let title = document_title(content, filename, DEFAULT_TITLE);
    ParsedConversation::new(
        Some(&title),
        DEFAULT_TITLE,
        messages,
        SourcePlatform::Claude,
        SourceFormat::Markdown,
    )
}
