//! Heading id generation and page outline.

use std::collections::HashMap;

use serde::Serialize;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Heading level (2-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Tracks assigned heading ids and collects the outline.
#[derive(Debug, Default)]
pub(crate) struct HeadingState {
    /// Counter for generating unique heading IDs.
    id_counts: HashMap<String, usize>,
    toc: Vec<TocEntry>,
}

impl HeadingState {
    /// Assign a unique id to a heading and record it in the outline.
    ///
    /// H1 headings get ids but stay out of the outline.
    pub(crate) fn complete_heading(&mut self, level: u8, text: &str) -> String {
        let id = self.generate_id(text);
        if level > 1 {
            self.toc.push(TocEntry {
                level,
                title: text.trim().to_owned(),
                id: id.clone(),
            });
        }
        id
    }

    /// Generate a unique ID for a heading.
    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id.push_str("section");
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub(crate) fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters. Non-ASCII letters are kept.
///
/// ```
/// use docsite_renderer::slugify;
///
/// assert_eq!(slugify("Get Started"), "get-started");
/// assert_eq!(slugify("What's new in 8.1?"), "whats-new-in-81");
/// assert_eq!(slugify("Über uns"), "über-uns");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    result
}
