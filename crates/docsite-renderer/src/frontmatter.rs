//! Frontmatter parsing.
//!
//! A document may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Install Storybook
//! short_title: Install
//! parent: docs/8.1/get-started/index
//! order: 2
//! ---
//!
//! # Body starts here
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CompileError;

/// Fence line opening and closing the frontmatter block.
const FENCE: &str = "---";

/// Metadata declared at the top of a content file.
///
/// Aliases used by older content (`sidebar_title`, `is_tab`, `tab`) are kept as
/// separate fields so a file carrying both spellings still parses; use the
/// accessor methods to read the effective value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Shorter title used in navigation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_title: Option<String>,

    /// Render as an in-page tab instead of a navigation entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_as_tab: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tab: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<bool>,

    /// Id of the parent page in the navigation tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Sort key among siblings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    /// Any other keys, kept for the rendering boundary.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Frontmatter {
    /// Parse frontmatter from the YAML inside the fences.
    ///
    /// Empty content yields the default frontmatter.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Frontmatter`] if the YAML is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, CompileError> {
        let trimmed = yaml.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(trimmed).map_err(|e| CompileError::Frontmatter(e.to_string()))
    }

    /// Navigation title: `short_title`, then `sidebar_title`.
    #[must_use]
    pub fn short_title(&self) -> Option<&str> {
        self.short_title
            .as_deref()
            .or(self.sidebar_title.as_deref())
    }

    /// Whether the page is flagged as a tab page under any spelling.
    #[must_use]
    pub fn is_tab(&self) -> bool {
        self.show_as_tab.or(self.is_tab).or(self.tab).unwrap_or(false)
    }
}

/// Split a document into its frontmatter and body.
///
/// The first line must be exactly `---` to open a block; the next `---` line
/// closes it. Without an opening fence the whole source is the body.
///
/// The returned body is always a suffix of `source`.
///
/// # Errors
///
/// Returns [`CompileError::Frontmatter`] for an unterminated block or
/// malformed YAML.
pub fn split_frontmatter(source: &str) -> Result<(Frontmatter, &str), CompileError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some(first_line_end) = text.find('\n') else {
        if text.trim_end() == FENCE {
            return Err(CompileError::Frontmatter(
                "unterminated frontmatter block".to_owned(),
            ));
        }
        return Ok((Frontmatter::default(), text));
    };

    if text[..first_line_end].trim_end() != FENCE {
        return Ok((Frontmatter::default(), text));
    }

    let yaml_start = first_line_end + 1;
    let mut offset = yaml_start;
    for line in text[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return Ok((Frontmatter::from_yaml(yaml)?, body));
        }
        offset += line.len();
    }

    Err(CompileError::Frontmatter(
        "unterminated frontmatter block".to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split_without_frontmatter() {
        let (fm, body) = split_frontmatter("# Hello\n\nText").unwrap();

        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "# Hello\n\nText");
    }

    #[test]
    fn test_split_with_frontmatter() {
        let source = "---\ntitle: Install\norder: 2\n---\n# Body\n";
        let (fm, body) = split_frontmatter(source).unwrap();

        assert_eq!(fm.title.as_deref(), Some("Install"));
        assert_eq!(fm.order, Some(2));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_split_crlf_fences() {
        let source = "---\r\ntitle: Windows\r\n---\r\nBody";
        let (fm, body) = split_frontmatter(source).unwrap();

        assert_eq!(fm.title.as_deref(), Some("Windows"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_empty_block() {
        let (fm, body) = split_frontmatter("---\n---\nBody").unwrap();

        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_strips_bom() {
        let (fm, _) = split_frontmatter("\u{feff}---\ntitle: Bom\n---\n").unwrap();

        assert_eq!(fm.title.as_deref(), Some("Bom"));
    }

    #[test]
    fn test_split_unterminated() {
        let err = split_frontmatter("---\ntitle: Oops\n# Body").unwrap_err();

        assert!(matches!(err, CompileError::Frontmatter(_)));
    }

    #[test]
    fn test_split_lone_fence_is_unterminated() {
        assert!(split_frontmatter("---").is_err());
    }

    #[test]
    fn test_split_malformed_yaml() {
        let err = split_frontmatter("---\ntitle: [unclosed\n---\n").unwrap_err();

        assert!(matches!(err, CompileError::Frontmatter(_)));
    }

    #[test]
    fn test_thematic_break_later_is_not_frontmatter() {
        let source = "Intro\n\n---\n\nMore";
        let (fm, body) = split_frontmatter(source).unwrap();

        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, source);
    }

    #[test]
    fn test_short_title_falls_back_to_sidebar_title() {
        let fm = Frontmatter::from_yaml("sidebar_title: Setup").unwrap();
        assert_eq!(fm.short_title(), Some("Setup"));

        let fm = Frontmatter::from_yaml("short_title: Short\nsidebar_title: Setup").unwrap();
        assert_eq!(fm.short_title(), Some("Short"));
    }

    #[test]
    fn test_tab_flag_spellings() {
        assert!(Frontmatter::from_yaml("show_as_tab: true").unwrap().is_tab());
        assert!(Frontmatter::from_yaml("is_tab: true").unwrap().is_tab());
        assert!(Frontmatter::from_yaml("tab: true").unwrap().is_tab());
        assert!(!Frontmatter::from_yaml("title: Plain").unwrap().is_tab());
        assert!(!Frontmatter::from_yaml("show_as_tab: false\ntab: true").unwrap().is_tab());
    }

    #[test]
    fn test_extra_keys_are_kept() {
        let fm = Frontmatter::from_yaml("title: T\nhide_rendererSelector: true").unwrap();

        assert_eq!(fm.extra.get("hide_rendererSelector"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_non_integer_order_is_error() {
        assert!(Frontmatter::from_yaml("order: first").is_err());
    }
}
