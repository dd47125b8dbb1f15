//! Query lexer (tokenizer).
//!
//! Converts a query string into the token stream the parser consumes. Tokens borrow their
//! text from the query and carry byte offsets into it.

use std::collections::HashSet;

use crate::{
    error::QueryError,
    normalize::{is_escapable, normalize},
    token::{Token, TokenKind},
};

/// Stopwords used when none are configured. Sorted for binary search.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Terms that the lexer reports as [`TokenKind::Stopword`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stopwords {
    /// The built-in list, [`DEFAULT_STOPWORDS`].
    #[default]
    Default,
    /// A custom list of lower-cased words.
    Custom(HashSet<String>),
}

impl Stopwords {
    /// Creates a custom list. Words are lower-cased.
    pub fn custom<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Custom(
            words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        )
    }

    /// A list that matches nothing.
    pub fn none() -> Self {
        Self::Custom(HashSet::new())
    }

    /// Returns true if the normalized `word` is a stopword.
    pub fn contains(&self, word: &str) -> bool {
        match self {
            Self::Default => DEFAULT_STOPWORDS.binary_search(&word).is_ok(),
            Self::Custom(words) => words.contains(word),
        }
    }
}

/// Returns true for characters that may appear unescaped inside a term.
fn is_term_char(ch: char) -> bool {
    ch == '_' || !(ch.is_ascii_punctuation() || ch.is_whitespace() || ch.is_control())
}

/// Returns the byte length of the number at the start of `text`.
///
/// Returns `None` if `text` does not start with a number, or if the number runs straight
/// into term characters (`12ab` is a term).
fn number_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let sign = match bytes.first() {
        Some(b'-' | b'+') => 1,
        _ => 0,
    };

    let end = if text
        .get(sign..sign + 3)
        .is_some_and(|word| word.eq_ignore_ascii_case("inf"))
    {
        sign + 3
    } else if bytes.first() == Some(&b'+') {
        return None;
    } else {
        let digits = |mut i: usize| {
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
            i
        };

        let mut i = digits(sign);
        if i == sign {
            return None;
        }
        if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
            i = digits(i + 1);
        }
        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            let mut j = i + 1;
            if matches!(bytes.get(j), Some(b'-' | b'+')) {
                j += 1;
            }
            if bytes.get(j).is_some_and(u8::is_ascii_digit) {
                i = digits(j);
            }
        }
        i
    };

    let glued = text
        .get(end..)
        .and_then(|rest| rest.chars().next())
        .is_some_and(is_term_char);
    (!glued).then_some(end)
}

/// Tokenizes a query string.
struct Lexer<'q, 's> {
    /// The original input string.
    input: &'q str,
    /// Current byte position in input.
    position: usize,
    /// Stopword list.
    stopwords: &'s Stopwords,
    /// Whether the position is between an opening and a closing quote.
    in_quotes: bool,
    /// Number of unclosed `{`.
    brace_depth: usize,
}

impl<'q, 's> Lexer<'q, 's> {
    /// Creates a new lexer for the given input.
    fn new(input: &'q str, stopwords: &'s Stopwords) -> Self {
        Self {
            input,
            position: 0,
            stopwords,
            in_quotes: false,
            brace_depth: 0,
        }
    }

    /// Returns the unconsumed input.
    fn rest(&self) -> &'q str {
        self.input.get(self.position..).unwrap_or_default()
    }

    /// Returns the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Returns the character after the next one.
    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.position += ch.len_utf8();
        }
    }

    /// Returns the input between `start` and the current position.
    fn slice_from(&self, start: usize) -> &'q str {
        self.input.get(start..self.position).unwrap_or_default()
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token<'q>>, QueryError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token::end(self.input.len()));

        Ok(tokens)
    }

    /// Returns the next token, or None at end of input.
    fn next_token(&mut self) -> Result<Option<Token<'q>>, QueryError> {
        loop {
            let Some(ch) = self.peek() else {
                return Ok(None);
            };
            let start = self.position;

            let kind = match ch {
                '|' => TokenKind::Or,
                '(' => TokenKind::Lp,
                ')' => TokenKind::Rp,
                '{' => {
                    self.brace_depth += 1;
                    TokenKind::Lb
                }
                '}' => {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    TokenKind::Rb
                }
                '[' => TokenKind::Lsqb,
                ']' => TokenKind::Rsqb,
                ',' => TokenKind::Comma,
                ':' => TokenKind::Colon,
                '~' => TokenKind::Tilde,
                '*' => TokenKind::Star,
                '"' => {
                    self.in_quotes = !self.in_quotes;
                    TokenKind::Quote
                }
                '@' => return self.read_modifier().map(Some),
                '-' | '+' => {
                    if let Some(token) = self.read_number() {
                        return Ok(Some(token));
                    }
                    if ch == '+' {
                        self.advance();
                        continue;
                    }
                    TokenKind::Minus
                }
                _ if ch.is_ascii_digit() => {
                    if let Some(token) = self.read_number() {
                        return Ok(Some(token));
                    }
                    return Ok(Some(self.read_term()));
                }
                _ if is_term_char(ch)
                    || (ch == '\\' && self.peek_second().is_some_and(is_escapable)) =>
                {
                    return Ok(Some(self.read_term()));
                }
                // Whitespace, control characters and other punctuation only separate
                // tokens.
                _ => {
                    self.advance();
                    continue;
                }
            };

            self.advance();
            return Ok(Some(Token::new(kind, self.slice_from(start), start)));
        }
    }

    /// Reads `@name`. The token points at the name, after the `@`.
    fn read_modifier(&mut self) -> Result<Token<'q>, QueryError> {
        let at = self.position;
        self.advance(); // consume '@'

        let start = self.position;
        self.skip_term_chars();
        if self.position == start {
            return Err(QueryError::Lex {
                message: "expected field name after '@'".to_string(),
                offset: at,
            });
        }

        Ok(Token::new(TokenKind::Modifier, self.slice_from(start), start))
    }

    /// Reads a number if one starts at the current position.
    fn read_number(&mut self) -> Option<Token<'q>> {
        let start = self.position;
        let len = number_len(self.rest())?;
        let text = self.input.get(start..start + len)?;
        let value = text.parse::<f64>().ok()?;
        self.position += len;
        Some(Token::number(text, start, value))
    }

    /// Reads a term, reporting known stopwords outside quotes and tag braces.
    fn read_term(&mut self) -> Token<'q> {
        let start = self.position;
        self.skip_term_chars();
        let text = self.slice_from(start);

        if text.eq_ignore_ascii_case("inf") {
            return Token::number(text, start, f64::INFINITY);
        }

        let kind = if !self.in_quotes
            && self.brace_depth == 0
            && self.stopwords.contains(&normalize(text))
        {
            TokenKind::Stopword
        } else {
            TokenKind::Term
        };
        Token::new(kind, text, start)
    }

    /// Advances past term characters and escape sequences.
    fn skip_term_chars(&mut self) {
        while let Some(ch) = self.peek() {
            if is_term_char(ch) {
                self.advance();
            } else if ch == '\\' && self.peek_second().is_some_and(is_escapable) {
                self.advance();
                self.advance();
            } else {
                break;
            }
        }
    }
}

/// Tokenizes a query string, appending an end-of-input token at `query.len()`.
pub fn tokenize<'q>(query: &'q str, stopwords: &Stopwords) -> Result<Vec<Token<'q>>, QueryError> {
    Lexer::new(query, stopwords).tokenize()
}

#[cfg(test)]
mod tests {
    use TokenKind::*;

    use super::*;

    /// Tokenizes with the default stopwords and returns `(kind, text)` pairs.
    fn lex(query: &str) -> Vec<(TokenKind, &str)> {
        tokenize(query, &Stopwords::default())
            .unwrap()
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect()
    }

    #[test]
    fn empty_query() {
        assert_eq!(lex(""), vec![(End, "")]);
        assert_eq!(lex("   "), vec![(End, "")]);
    }

    #[test]
    fn terms_and_offsets() {
        let tokens = tokenize("hello  world", &Stopwords::default()).unwrap();
        assert_eq!(tokens[0], Token::new(Term, "hello", 0));
        assert_eq!(tokens[1], Token::new(Term, "world", 7));
        assert_eq!(tokens[2], Token::end(12));
    }

    #[test]
    fn operators() {
        assert_eq!(
            lex("(x|b) -c ~d e*"),
            vec![
                (Lp, "("),
                (Term, "x"),
                (Or, "|"),
                (Term, "b"),
                (Rp, ")"),
                (Minus, "-"),
                (Term, "c"),
                (Tilde, "~"),
                (Term, "d"),
                (Term, "e"),
                (Star, "*"),
                (End, ""),
            ]
        );
    }

    #[test]
    fn modifier_points_at_name() {
        let tokens = tokenize("@title:hello", &Stopwords::default()).unwrap();
        assert_eq!(tokens[0], Token::new(Modifier, "title", 1));
        assert_eq!(tokens[1], Token::new(Colon, ":", 6));
        assert_eq!(tokens[2], Token::new(Term, "hello", 7));
    }

    #[test]
    fn bare_at_is_an_error() {
        let err = tokenize("foo @ bar", &Stopwords::default()).unwrap_err();
        assert_eq!(err.offset(), 4);
        assert!(matches!(err, QueryError::Lex { .. }));
    }

    #[test]
    fn numbers() {
        let tokens = tokenize("12 -1.5 3e4 inf -inf +inf", &Stopwords::default()).unwrap();
        let values: Vec<f64> = tokens
            .iter()
            .filter(|token| token.kind == Number)
            .map(|token| token.value)
            .collect();
        assert_eq!(
            values,
            vec![12.0, -1.5, 3e4, f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY]
        );
    }

    #[test]
    fn digits_glued_to_letters_are_terms() {
        assert_eq!(lex("12ab"), vec![(Term, "12ab"), (End, "")]);
        assert_eq!(lex("abc123"), vec![(Term, "abc123"), (End, "")]);
    }

    #[test]
    fn minus_before_word_is_negation() {
        assert_eq!(
            lex("-information"),
            vec![(Minus, "-"), (Term, "information"), (End, "")]
        );
    }

    #[test]
    fn numeric_range() {
        assert_eq!(
            lex("@price:[(10 20]"),
            vec![
                (Modifier, "price"),
                (Colon, ":"),
                (Lsqb, "["),
                (Lp, "("),
                (Number, "10"),
                (Number, "20"),
                (Rsqb, "]"),
                (End, ""),
            ]
        );
    }

    #[test]
    fn stopwords_outside_quotes_and_braces() {
        assert_eq!(
            lex("the \"the\" {the}"),
            vec![
                (Stopword, "the"),
                (Quote, "\""),
                (Term, "the"),
                (Quote, "\""),
                (Lb, "{"),
                (Term, "the"),
                (Rb, "}"),
                (End, ""),
            ]
        );
    }

    #[test]
    fn stopword_match_ignores_case() {
        assert_eq!(lex("The"), vec![(Stopword, "The"), (End, "")]);
    }

    #[test]
    fn custom_stopwords() {
        let stopwords = Stopwords::custom(["Foo"]);
        let tokens = tokenize("foo the", &stopwords).unwrap();
        assert_eq!(tokens[0].kind, Stopword);
        assert_eq!(tokens[1].kind, Term);

        let tokens = tokenize("the", &Stopwords::none()).unwrap();
        assert_eq!(tokens[0].kind, Term);
    }

    #[test]
    fn escapes_stay_in_term() {
        assert_eq!(lex(r"foo\-bar"), vec![(Term, r"foo\-bar"), (End, "")]);
        assert_eq!(lex(r"\@home"), vec![(Term, r"\@home"), (End, "")]);
    }

    #[test]
    fn other_punctuation_separates() {
        assert_eq!(
            lex("x.b;c \\d"),
            vec![
                (Term, "x"),
                (Term, "b"),
                (Term, "c"),
                (Term, "d"),
                (End, "")
            ]
        );
    }

    #[test]
    fn unicode_terms() {
        let tokens = tokenize("café über", &Stopwords::default()).unwrap();
        assert_eq!(tokens[0].text, "café");
        assert_eq!(tokens[1].offset, 6);
        assert_eq!(tokens[2], Token::end(11));
    }

    #[test]
    fn default_list_is_sorted() {
        assert!(DEFAULT_STOPWORDS.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
