//! Reader feedback submissions.

use std::fmt;

use serde::Deserialize;

/// Thumbs up or down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Up,
    Down,
}

impl Reaction {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Up => "👍",
            Self::Down => "👎",
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

/// Validated feedback for a docs page.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Feedback {
    /// Page slug (e.g., `/docs/writing-stories`).
    pub slug: String,
    /// Free-form comment.
    pub feedback: String,
    pub reaction: Reaction,
    pub renderer: String,
    /// Code snippet language selected by the reader.
    pub language: String,
    pub version: String,
}

impl Feedback {
    /// Page path without the `/docs` prefix.
    #[must_use]
    pub fn page_path(&self) -> &str {
        self.slug.strip_prefix("/docs").unwrap_or(&self.slug)
    }

    /// Discussion title grouping all feedback for a page.
    #[must_use]
    pub fn title(&self) -> String {
        format!("Feedback for {} docs page", self.page_path())
    }

    /// Markdown comment body with a metadata table.
    #[must_use]
    pub fn comment_body(&self) -> String {
        let meta = format!(
            "| {} | v{} | {} | {} |\r\n| - | - | - | - |",
            self.reaction.symbol(),
            self.version,
            self.renderer,
            self.language
        );
        [format!("**{}**", self.slug), meta, self.feedback.clone()]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\r\n\r\n")
    }
}

/// Destination for accepted feedback.
pub trait FeedbackSink: Send + Sync {
    /// Record one submission.
    ///
    /// # Errors
    ///
    /// Returns an error message if the submission could not be recorded.
    fn submit(&self, feedback: &Feedback) -> Result<(), String>;
}

/// Sink that writes feedback to the log.
#[derive(Debug, Default)]
pub struct LogFeedbackSink;

impl FeedbackSink for LogFeedbackSink {
    fn submit(&self, feedback: &Feedback) -> Result<(), String> {
        tracing::info!(
            title = %feedback.title(),
            reaction = %feedback.reaction,
            version = %feedback.version,
            renderer = %feedback.renderer,
            body = %feedback.comment_body(),
            "Received docs feedback"
        );
        Ok(())
    }
}
