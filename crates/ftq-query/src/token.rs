//! Tokens consumed by the parser.
//!
//! Tokens are produced by a lexer (see [`crate::lexer`] for the bundled one) and borrow
//! their text from the query buffer.

use std::fmt;

use serde::Serialize;

/// The grammar terminal a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// A bare search term.
    Term,
    /// A numeric literal. The value is in [`Token::value`].
    Number,
    /// A double quote.
    Quote,
    /// `:` after a field modifier.
    Colon,
    /// `-` (negation, or sign inside a range).
    Minus,
    /// `@field`; the token text is the field name without `@`.
    Modifier,
    /// A term on the stopword list.
    Stopword,
    /// `(`
    Lp,
    /// `)`
    Rp,
    /// `|`
    Or,
    /// `*` after a term.
    Star,
    /// `{`
    Lb,
    /// `}`
    Rb,
    /// `,`
    Comma,
    /// `[`
    Lsqb,
    /// `]`
    Rsqb,
    /// `~`
    Tilde,
    /// End of input.
    End,
}

impl TokenKind {
    /// Returns the terminal name as it appears in the grammar.
    pub fn name(self) -> &'static str {
        match self {
            Self::Term => "TERM",
            Self::Number => "NUMBER",
            Self::Quote => "QUOTE",
            Self::Colon => "COLON",
            Self::Minus => "MINUS",
            Self::Modifier => "MODIFIER",
            Self::Stopword => "STOPWORD",
            Self::Lp => "LP",
            Self::Rp => "RP",
            Self::Or => "OR",
            Self::Star => "STAR",
            Self::Lb => "LB",
            Self::Rb => "RB",
            Self::Comma => "COMMA",
            Self::Lsqb => "LSQB",
            Self::Rsqb => "RSQB",
            Self::Tilde => "TILDE",
            Self::End => "$",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified, positioned slice of the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Token<'q> {
    /// Terminal kind.
    pub kind: TokenKind,
    /// Text of the token within the query buffer.
    pub text: &'q str,
    /// Byte offset of the token in the query.
    pub offset: usize,
    /// Numeric value; meaningful only for [`TokenKind::Number`].
    pub value: f64,
}

impl<'q> Token<'q> {
    /// Creates a non-numeric token.
    pub fn new(kind: TokenKind, text: &'q str, offset: usize) -> Self {
        Self {
            kind,
            text,
            offset,
            value: 0.0,
        }
    }

    /// Creates a `NUMBER` token.
    pub fn number(text: &'q str, offset: usize, value: f64) -> Self {
        Self {
            kind: TokenKind::Number,
            text,
            offset,
            value,
        }
    }

    /// Creates the end-of-input marker at `offset`.
    pub fn end(offset: usize) -> Self {
        Self::new(TokenKind::End, "", offset)
    }

    /// Byte offset just past this token.
    pub fn end_offset(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Returns true if this token can be reduced to the `term` nonterminal on its own.
    pub fn is_term(&self) -> bool {
        matches!(self.kind, TokenKind::Term | TokenKind::Number)
    }
}
