//! Compile error type.

/// Error raised while compiling an MDX document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Frontmatter block is unterminated or not valid YAML.
    #[error("invalid frontmatter: {0}")]
    Frontmatter(String),

    /// Component tag not present in the allow-list.
    #[error("unknown component <{name}> at line {line}")]
    UnknownComponent {
        /// Component name as written.
        name: String,
        /// 1-based source line.
        line: usize,
    },

    /// Opening component tag without a matching closing tag.
    #[error("unclosed component <{name}> opened at line {line}")]
    UnclosedComponent {
        /// Component name.
        name: String,
        /// 1-based source line of the opening tag.
        line: usize,
    },

    /// Closing component tag that does not match the innermost open tag.
    #[error("unexpected closing tag </{name}> at line {line}")]
    UnexpectedClosingTag {
        /// Component name.
        name: String,
        /// 1-based source line.
        line: usize,
    },

    /// Component tag whose attribute list cannot be parsed.
    #[error("malformed attributes on <{name}> at line {line}: {message}")]
    MalformedTag {
        /// Component name.
        name: String,
        /// 1-based source line.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

impl CompileError {
    /// Shift the reported line by `offset` lines.
    ///
    /// Used when the scanned text starts below the top of the source file.
    #[must_use]
    pub(crate) fn offset_line(mut self, offset: usize) -> Self {
        match &mut self {
            Self::UnknownComponent { line, .. }
            | Self::UnclosedComponent { line, .. }
            | Self::UnexpectedClosingTag { line, .. }
            | Self::MalformedTag { line, .. } => *line += offset,
            Self::Frontmatter(_) => {}
        }
        self
    }
}
