use serde::{Deserialize, Serialize};

/// Snippets longer than this many characters are cut before classification.
pub const SNIPPET_LIMIT: usize = 500;

/// One email as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSignal {
    pub sender: String,
    pub subject: String,
    pub snippet: String,
}

impl EmailSignal {
    /// Build a signal from a raw From header, subject and body snippet
    pub fn new(from: &str, subject: &str, snippet: &str) -> Self {
        Self {
            sender: normalize_sender(from),
            subject: subject.to_string(),
            snippet: truncate_chars(snippet, SNIPPET_LIMIT),
        }
    }

    /// Lowercase subject and snippet joined by a space
    pub fn text(&self) -> String {
        format!("{} {}", self.subject, self.snippet).to_lowercase()
    }

    pub fn sender_domain(&self) -> Option<String> {
        crate::domain_utils::DomainUtils::extract_domain(&self.sender)
    }
}

/// Extract the address from a header like "Name <email@domain.com>".
///
/// Best effort: malformed input comes back lowercased rather than rejected.
pub fn normalize_sender(raw: &str) -> String {
    if let Some(start) = raw.rfind('<') {
        if let Some(len) = raw[start + 1..].find('>') {
            return raw[start + 1..start + 1 + len].trim().to_lowercase();
        }
    }
    raw.trim().to_lowercase()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_display_name() {
        assert_eq!(
            normalize_sender("Jane Doe <Jane@Example.EDU>"),
            "jane@example.edu"
        );
        assert_eq!(
            normalize_sender("\"Doe, Jane\" < jane@example.edu >"),
            "jane@example.edu"
        );
    }

    #[test]
    fn test_normalize_bare_and_malformed() {
        assert_eq!(normalize_sender("  Bob@Mail.COM "), "bob@mail.com");
        assert_eq!(normalize_sender("Not An Address"), "not an address");
        assert_eq!(normalize_sender("Broken <oops"), "broken <oops");
        assert_eq!(normalize_sender(""), "");
    }

    #[test]
    fn test_snippet_truncation() {
        let long = "é".repeat(SNIPPET_LIMIT + 20);
        let signal = EmailSignal::new("a@b.c", "s", &long);
        assert_eq!(signal.snippet.chars().count(), SNIPPET_LIMIT);

        let short = EmailSignal::new("a@b.c", "s", "short");
        assert_eq!(short.snippet, "short");
    }

    #[test]
    fn test_text_is_lowercase() {
        let signal = EmailSignal::new("a@b.c", "Meeting TOMORROW", "Agenda");
        assert_eq!(signal.text(), "meeting tomorrow agenda");
        assert_eq!(signal.sender_domain().as_deref(), Some("b.c"));
    }
}
