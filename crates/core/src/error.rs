use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Which rule chain a lookup was performed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulerKind {
    /// Inline rules run per paragraph chunk.
    Inline,
    /// Block rules run per line.
    Block,
}

impl std::fmt::Display for RulerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulerKind::Inline => f.write_str("inline"),
            RulerKind::Block => f.write_str("block"),
        }
    }
}

/// Errors that can occur during Markdown processing.
#[derive(Debug, Error)]
pub enum MultimarkError {
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// A rule was positioned relative to a rule that is not registered.
    #[error("No {ruler} rule named `{name}`")]
    RuleNotFound {
        /// Ruler that was searched
        ruler: RulerKind,
        /// Missing anchor rule name
        name: String,
    },
    /// Extension options could not be decoded or failed validation.
    #[error("Invalid options for extension `{extension}`: {message}")]
    InvalidOptions {
        /// Extension name
        extension: String,
        /// What was wrong with the options
        message: String,
    },
    /// Renderer configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Internal logic error (unexpected state).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl MultimarkError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Create an options error for the named extension
    pub fn invalid_options(extension: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            extension: extension.into(),
            message: message.into(),
        }
    }

    /// Create a missing-anchor error
    pub fn rule_not_found(ruler: RulerKind, name: impl Into<String>) -> Self {
        Self::RuleNotFound {
            ruler,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_location() {
        let err = MultimarkError::parse_error("unexpected end", 3, 7);
        assert_eq!(err.to_string(), "Parse error at 3:7: unexpected end");
    }

    #[test]
    fn rule_not_found_names_the_ruler() {
        let err = MultimarkError::rule_not_found(RulerKind::Inline, "emphasis");
        assert_eq!(err.to_string(), "No inline rule named `emphasis`");
    }
}
