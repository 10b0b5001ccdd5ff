//! Prompt template for topic labels

/// Prompt builder for topic labeling
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the labeling prompt, keeping the first `max_chars` characters of
    /// the message
    pub fn build_topic_prompt(content: &str, max_chars: usize) -> String {
        let excerpt: String = content.chars().take(max_chars).collect();
        format!(
            "Summarize this message in 3-5 words as a topic label. Be specific and descriptive.\n\nMessage: \"{}\"\n\nTopic:",
            excerpt
        )
    }

    /// Normalize a raw model reply into a label; may return an empty string
    pub fn clean_label(raw: &str) -> String {
        const QUOTES: &[char] = &['"', '\'', '`', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

        let line = raw.trim().lines().next().unwrap_or_default();
        let line = line.strip_prefix("Topic:").unwrap_or(line);
        line.trim().trim_matches(QUOTES).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_truncates_by_characters() {
        let content = "é".repeat(600);
        let prompt = PromptBuilder::build_topic_prompt(&content, 500);
        assert!(prompt.starts_with("Summarize this message in 3-5 words as a topic label."));
        assert!(prompt.ends_with("\"\n\nTopic:"));
        assert_eq!(prompt.matches('é').count(), 500);
    }

    #[test]
    fn test_short_content_untouched() {
        let prompt = PromptBuilder::build_topic_prompt("Where to hike?", 500);
        assert!(prompt.contains("Message: \"Where to hike?\""));
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(PromptBuilder::clean_label("  \"Trip Planning\"  \n"), "Trip Planning");
        assert_eq!(PromptBuilder::clean_label("Topic: Rust Lifetimes"), "Rust Lifetimes");
        assert_eq!(PromptBuilder::clean_label("\u{201c}Garden Layout\u{201d}\nextra"), "Garden Layout");
        assert_eq!(PromptBuilder::clean_label("  \"\" "), "");
    }
}
