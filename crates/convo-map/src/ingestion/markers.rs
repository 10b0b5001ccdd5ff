//! Role-boundary markers in loosely formatted conversation text
//!
//! Four line-level syntaxes are recognized, each for the same role names:
//!
//! | Syntax  | Example            |
//! |---------|--------------------|
//! | Heading | `## Assistant`     |
//! | Bold    | `**Human:**`       |
//! | Label   | `User: how do I…`  |
//! | Banner  | `--- Claude ---`   |
//!
//! `Human`/`User` mark the user; `Assistant`/`AI`/`Claude`/`GPT` mark the
//! assistant. Matching is case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Role;

const ROLE_NAMES: &str = "human|user|assistant|ai|claude|gpt";

/// Which syntax produced a marker match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSyntax {
    Heading,
    Bold,
    Label,
    Banner,
}

/// One recognized marker. `position..end` is the marker text to strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerMatch {
    pub position: usize,
    pub end: usize,
    pub role: Role,
    pub syntax: MarkerSyntax,
}

static PATTERNS: Lazy<Vec<(MarkerSyntax, Regex)>> = Lazy::new(|| {
    let sources = [
        (
            MarkerSyntax::Heading,
            format!(r"(?mi)^[ \t]*#{{1,3}}[ \t]*(?P<name>{ROLE_NAMES})[ \t]*:?[ \t]*\r?$"),
        ),
        (
            MarkerSyntax::Bold,
            format!(r"(?mi)^[ \t]*\*\*(?P<name>{ROLE_NAMES})[ \t]*:?[ \t]*\*\*(?:[ \t]*:)?"),
        ),
        (
            MarkerSyntax::Label,
            format!(r"(?mi)^[ \t]*(?P<name>{ROLE_NAMES})[ \t]*:"),
        ),
        (
            MarkerSyntax::Banner,
            format!(r"(?mi)^[ \t]*-{{3,}}[ \t]*(?P<name>{ROLE_NAMES})[ \t]*:?[ \t]*-{{3,}}[ \t]*\r?$"),
        ),
    ];

    sources
        .into_iter()
        .filter_map(|(syntax, source)| match Regex::new(&source) {
            Ok(re) => Some((syntax, re)),
            Err(e) => {
                tracing::error!("Invalid marker pattern for {:?}: {}", syntax, e);
                None
            }
        })
        .collect()
});

fn role_for_name(name: &str) -> Role {
    match name.to_ascii_lowercase().as_str() {
        "human" | "user" => Role::User,
        _ => Role::Assistant,
    }
}

/// All marker occurrences in `text`, sorted by position.
///
/// Matches from different syntaxes at the same position are all kept;
/// callers must tolerate duplicates and overlaps.
pub fn find_markers(text: &str) -> Vec<MarkerMatch> {
    let mut matches: Vec<MarkerMatch> = PATTERNS
        .iter()
        .flat_map(|(syntax, re)| {
            re.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                let name = caps.name("name")?;
                Some(MarkerMatch {
                    position: whole.start(),
                    end: whole.end(),
                    role: role_for_name(name.as_str()),
                    syntax: *syntax,
                })
            })
        })
        .collect();

    matches.sort_by_key(|m| m.position);
    matches
}

/// Whether `text` contains at least one marker
pub fn has_markers(text: &str) -> bool {
    PATTERNS.iter().any(|(_, re)| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_syntaxes() {
        let text = "## Human\nhi\n**Assistant:** hello\nUser: again\n--- Claude ---\nbye\n";
        let found = find_markers(text);
        let syntaxes: Vec<_> = found.iter().map(|m| m.syntax).collect();
        assert_eq!(
            syntaxes,
            vec![
                MarkerSyntax::Heading,
                MarkerSyntax::Bold,
                MarkerSyntax::Label,
                MarkerSyntax::Banner
            ]
        );
        let roles: Vec<_> = found.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn test_sorted_by_position() {
        let text = "AI: one\n# Human\ntwo\nGPT: three";
        let found = find_markers(text);
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].position <= w[1].position));
        assert_eq!(found[0].role, Role::Assistant);
        assert_eq!(found[1].role, Role::User);
    }

    #[test]
    fn test_case_insensitive_and_line_anchored() {
        assert_eq!(find_markers("HUMAN: shout").len(), 1);
        assert!(find_markers("I asked the assistant: nothing").is_empty());
        assert!(find_markers("Users: plural is not a marker").is_empty());
    }

    #[test]
    fn test_plain_prose_has_no_markers() {
        let text = "# Release notes\n\n- fixed a bug\n---\nThanks";
        assert!(find_markers(text).is_empty());
        assert!(!has_markers(text));
    }

    #[test]
    fn test_crlf_lines() {
        let found = find_markers("# Human\r\nhi\r\n--- Assistant ---\r\nhello");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_marker_span_covers_label() {
        let text = "**User:** question";
        let found = find_markers(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].end..], " question");

        let text = "**Assistant** : answer";
        let found = find_markers(text);
        assert_eq!(found[0].syntax, MarkerSyntax::Bold);
        assert_eq!(&text[found[0].end..], " answer");
    }
}
