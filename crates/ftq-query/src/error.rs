//! Error types for query lexing and parsing.

use thiserror::Error;

/// An error produced while turning query text into a tree.
///
/// Every variant that can be tied to a position carries the byte offset in the query, so
/// [`QueryError::render`] can point at it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The lexer could not classify part of the input.
    #[error("{message}")]
    Lex {
        /// Error message.
        message: String,
        /// Byte offset of the offending character.
        offset: usize,
    },

    /// A token that no grammar rule accepts in the current position.
    #[error("Syntax error at offset {offset} near '{near}'")]
    Syntax {
        /// Byte offset of the offending token.
        offset: usize,
        /// Text of the offending token (empty at end of input).
        near: String,
    },

    /// A well-formed filter whose values were rejected by the schema's validator.
    #[error("{message}")]
    InvalidFilter {
        /// Message from the validator.
        message: String,
        /// Byte offset of the filter's opening bracket.
        offset: usize,
    },

    /// Nesting went deeper than the configured limit.
    #[error("query nesting exceeds the maximum depth of {limit}")]
    StackOverflow {
        /// The configured limit.
        limit: usize,
        /// Byte offset of the token that went over the limit.
        offset: usize,
    },

    /// A schema with more fields than a field mask can address.
    #[error("schema has {count} fields, at most {limit} are supported")]
    TooManyFields {
        /// Number of fields given.
        count: usize,
        /// Maximum number of fields.
        limit: usize,
    },
}

impl QueryError {
    /// Creates a syntax error for the token at `offset` with text `near`.
    pub fn syntax(offset: usize, near: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            near: near.into(),
        }
    }

    /// Returns the byte offset the error points at.
    pub fn offset(&self) -> usize {
        match self {
            Self::Lex { offset, .. }
            | Self::Syntax { offset, .. }
            | Self::InvalidFilter { offset, .. }
            | Self::StackOverflow { offset, .. } => *offset,
            Self::TooManyFields { .. } => 0,
        }
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Syntax { near, .. } if near.is_empty() => Some(
                "The query ended early: check for a dangling field scope, operator or unclosed group",
            ),
            Self::Syntax { near, .. } if near == ")" => {
                Some("Remove the extra ) or add a matching (")
            }
            Self::Syntax { near, .. } if near == "|" => {
                Some("| requires expressions on both sides, e.g. 'rust|golang'")
            }
            Self::InvalidFilter { message, .. } if message.contains("unit") => {
                Some("Valid units are: m, km, mi, ft")
            }
            Self::StackOverflow { .. } => Some("Remove redundant parentheses or operators"),
            _ => None,
        }
    }

    /// Formats the error with the query and a pointer at the offending position.
    pub fn render(&self, query: &str) -> String {
        let prefix = match self {
            Self::Lex { .. } | Self::Syntax { .. } => "query syntax error",
            Self::InvalidFilter { .. }
            | Self::StackOverflow { .. }
            | Self::TooManyFields { .. } => "query error",
        };

        let clamped = self.offset().min(query.len());
        let column = query
            .get(..clamped)
            .map_or(clamped, |head| head.chars().count());

        let mut result = format!("{prefix}: {self}\n  {query}\n  {}^", " ".repeat(column));
        if let Some(suggestion) = self.suggestion() {
            result.push_str("\nhint: ");
            result.push_str(suggestion);
        }
        result
    }
}
