//! Query parser.
//!
//! Parses a token stream into a query tree using recursive descent. Each grammar rule
//! in [`Production`] is reduced by exactly one place below, and reported to the tracer
//! when it is.
//!
//! # Precedence (highest to lowest)
//!
//! 1. Grouping `(...)`, quotes, field scoping `@field:` and negation `-`; each applies
//!    to the single expression that follows.
//! 2. Intersection (implicit, between adjacent expressions).
//! 3. Union `|`.
//! 4. Optional `~`, which takes everything up to the closing `)` or the end of input.
//!
//! Every fragment under construction is owned by the call that is building it, so an
//! error unwinding through `?` drops exactly what was built so far.

use tracing::debug;

use crate::{
    ast::{FieldMask, QueryNode},
    error::QueryError,
    grammar::{self, Num, Production},
    schema::Schema,
    token::{Token, TokenKind},
    trace::{NoopTracer, Tracer},
};

/// Nesting limit used unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Highest nesting limit a parser accepts; larger limits are clamped to it.
///
/// Every nesting level is a native call, so the limit has to fit comfortably in a
/// thread's stack.
pub const MAX_DEPTH_LIMIT: usize = 128;

/// Parser limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum nesting of groups, quotes, operators and field scopes.
    pub max_depth: usize,
}

impl ParserOptions {
    /// Returns these options with `max_depth` capped at [`MAX_DEPTH_LIMIT`].
    pub fn clamped(self) -> Self {
        Self {
            max_depth: self.max_depth.min(MAX_DEPTH_LIMIT),
        }
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parses token streams against one schema.
///
/// A parser holds no per-parse state and can be reused for any number of queries.
pub struct Parser<'s, T = NoopTracer> {
    /// Field resolution and filter validation.
    schema: &'s dyn Schema,
    /// Limits.
    options: ParserOptions,
    /// Receives parse events.
    tracer: T,
}

impl<'s> Parser<'s> {
    /// Creates a parser with default options and no tracing.
    pub fn new(schema: &'s dyn Schema) -> Self {
        Self {
            schema,
            options: ParserOptions::default(),
            tracer: NoopTracer,
        }
    }
}

impl<'s, T: Tracer> Parser<'s, T> {
    /// Replaces the options. `max_depth` is capped at [`MAX_DEPTH_LIMIT`].
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        if options.max_depth > MAX_DEPTH_LIMIT {
            debug!(
                requested = options.max_depth,
                limit = MAX_DEPTH_LIMIT,
                "clamping max_depth"
            );
        }
        self.options = options.clamped();
        self
    }

    /// Replaces the tracer.
    pub fn with_tracer<U: Tracer>(self, tracer: U) -> Parser<'s, U> {
        Parser {
            schema: self.schema,
            options: self.options,
            tracer,
        }
    }

    /// Returns the options.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Returns the tracer.
    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Parses a token stream.
    ///
    /// Returns `Ok(None)` for an empty query. A stream that ends without an end-of-input
    /// token is treated as if one followed the last token; tokens after an end-of-input
    /// token are never read.
    pub fn parse_tokens<'q, I>(&mut self, tokens: I) -> Result<Option<QueryNode>, QueryError>
    where
        I: IntoIterator<Item = Token<'q>>,
    {
        let mut ctx = ParseContext {
            tokens: TokenStream::new(tokens.into_iter()),
            schema: self.schema,
            tracer: &mut self.tracer,
            max_depth: self.options.max_depth,
            depth: 0,
            invalid_filter: None,
        };

        let result = ctx.parse_query();
        ctx.finish(result)
    }
}

/// Token source with one token of lookahead and a guaranteed end-of-input token.
struct TokenStream<'q, I> {
    /// Underlying tokens.
    tokens: I,
    /// Lookahead, if already pulled.
    peeked: Option<Token<'q>>,
    /// End-of-input token, once reached.
    end: Option<Token<'q>>,
    /// Byte offset just past the last token pulled.
    last_end: usize,
}

impl<'q, I: Iterator<Item = Token<'q>>> TokenStream<'q, I> {
    /// Wraps a token iterator.
    fn new(tokens: I) -> Self {
        Self {
            tokens,
            peeked: None,
            end: None,
            last_end: 0,
        }
    }

    /// Returns the next token without consuming it.
    fn peek(&mut self) -> Token<'q> {
        if let Some(token) = self.peeked {
            return token;
        }
        let token = self.pull();
        self.peeked = Some(token);
        token
    }

    /// Consumes the next token. Past the end, keeps returning the end-of-input token.
    fn advance(&mut self) -> Token<'q> {
        let token = self.peek();
        self.peeked = None;
        token
    }

    /// Reads one token from the underlying iterator.
    fn pull(&mut self) -> Token<'q> {
        if let Some(end) = self.end {
            return end;
        }
        match self.tokens.next() {
            Some(token) if token.kind == TokenKind::End => {
                self.end = Some(token);
                token
            }
            Some(token) => {
                self.last_end = token.end_offset();
                token
            }
            None => {
                let end = Token::end(self.last_end);
                self.end = Some(end);
                end
            }
        }
    }
}

/// State of a single parse.
struct ParseContext<'p, 'q, I, T> {
    /// Token source.
    tokens: TokenStream<'q, I>,
    /// Field resolution and filter validation.
    schema: &'p dyn Schema,
    /// Receives parse events.
    tracer: &'p mut T,
    /// Nesting limit.
    max_depth: usize,
    /// Current nesting.
    depth: usize,
    /// First filter rejected by the schema. Parsing continues past it.
    invalid_filter: Option<QueryError>,
}

impl<'q, I, T> ParseContext<'_, 'q, I, T>
where
    I: Iterator<Item = Token<'q>>,
    T: Tracer,
{
    /// Turns the grammar's outcome into the parse result.
    ///
    /// A rejected filter fails an otherwise successful parse; a fatal error takes its
    /// place.
    fn finish(
        mut self,
        result: Result<Option<QueryNode>, QueryError>,
    ) -> Result<Option<QueryNode>, QueryError> {
        let result = match (result, self.invalid_filter.take()) {
            (Ok(_), Some(err)) => Err(err),
            (result, _) => result,
        };

        match &result {
            Ok(root) => {
                self.tracer.trace_accept();
                debug!(empty = root.is_none(), "query parsed");
            }
            Err(err) => {
                self.tracer.trace_error(err);
                debug!(offset = err.offset(), "query rejected: {err}");
            }
        }
        result
    }

    /// Returns the kind of the next token.
    fn peek_kind(&mut self) -> TokenKind {
        self.tokens.peek().kind
    }

    /// Consumes the next token.
    fn advance(&mut self) -> Token<'q> {
        let token = self.tokens.advance();
        self.tracer.trace_input(&token);
        token
    }

    /// Consumes the next token if it is of `kind`, failing on anything else.
    fn expect(&mut self, kind: TokenKind) -> Result<Token<'q>, QueryError> {
        let token = self.tokens.peek();
        if token.kind == kind {
            Ok(self.advance())
        } else {
            Err(unexpected(token))
        }
    }

    /// Reports a reduction.
    fn reduce(&mut self, production: Production) {
        self.tracer.trace_reduce(production);
    }

    /// Enters one nesting level at `token`.
    fn enter(&mut self, token: Token<'q>) -> Result<(), QueryError> {
        self.check_depth(self.depth + 1, token)?;
        self.depth += 1;
        Ok(())
    }

    /// Leaves one nesting level.
    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Fails if `depth` exceeds the limit.
    fn check_depth(&self, depth: usize, token: Token<'q>) -> Result<(), QueryError> {
        if depth > self.max_depth {
            return Err(QueryError::StackOverflow {
                limit: self.max_depth,
                offset: token.offset,
            });
        }
        Ok(())
    }

    /// Resolves a field name.
    fn field_mask(&self, name: &str) -> FieldMask {
        self.schema.field_mask(name)
    }

    /// query → expr | ε
    fn parse_query(&mut self) -> Result<Option<QueryNode>, QueryError> {
        if self.peek_kind() == TokenKind::End {
            self.reduce(Production::QueryEmpty);
            return Ok(None);
        }

        let root = self.parse_union()?;

        let next = self.tokens.peek();
        if next.kind != TokenKind::End {
            return Err(unexpected(next));
        }
        self.reduce(Production::Query);
        Ok(root)
    }

    /// union → intersection ("|" intersection)*
    fn parse_union(&mut self) -> Result<Option<QueryNode>, QueryError> {
        let left = self.parse_intersection()?;
        if self.peek_kind() != TokenKind::Or {
            return Ok(left);
        }

        self.advance(); // consume |
        let right = self.parse_intersection()?;
        let mut union = grammar::union_start(left, right);
        self.reduce(Production::UnionStart);

        while self.peek_kind() == TokenKind::Or {
            self.advance(); // consume |
            let right = self.parse_intersection()?;
            grammar::union_append(&mut union, right);
            self.reduce(Production::UnionAppend);
        }

        self.reduce(Production::ExprUnion);
        Ok(grammar::finish_union(union))
    }

    /// intersection → unary+
    fn parse_intersection(&mut self) -> Result<Option<QueryNode>, QueryError> {
        let mut expr = self.parse_unary()?;

        while starts_expr(self.peek_kind()) {
            let right = self.parse_unary()?;
            expr = grammar::intersect(expr, right);
            self.reduce(Production::Intersect);
        }

        Ok(expr)
    }

    /// unary → "-" unary | "~" union | scoped | "(" union ")" | quoted | term "*"? | STOPWORD
    fn parse_unary(&mut self) -> Result<Option<QueryNode>, QueryError> {
        let token = self.tokens.peek();
        self.enter(token)?;

        let expr = match token.kind {
            TokenKind::Minus => {
                self.advance();
                let child = self.parse_unary()?;
                self.reduce(Production::Not);
                grammar::not(child)
            }
            TokenKind::Tilde => {
                self.advance();
                let child = self.parse_union()?;
                self.reduce(Production::Optional);
                grammar::optional(child)
            }
            TokenKind::Modifier => self.parse_scoped()?,
            TokenKind::Lp => {
                self.advance();
                let inner = self.parse_union()?;
                self.expect(TokenKind::Rp)?;
                self.reduce(Production::Group);
                inner
            }
            TokenKind::Stopword => {
                self.advance();
                self.reduce(Production::ExprStopword);
                None
            }
            TokenKind::Quote => Some(self.parse_quoted()?),
            TokenKind::Term | TokenKind::Number => {
                let text = self.parse_term()?;
                Some(self.finish_term(text))
            }
            _ => return Err(unexpected(token)),
        };

        self.leave();
        Ok(expr)
    }

    /// term → TERM | NUMBER | QUOTE term QUOTE
    fn parse_term(&mut self) -> Result<&'q str, QueryError> {
        let token = self.tokens.peek();
        match token.kind {
            TokenKind::Term => {
                self.advance();
                self.reduce(Production::TermTerm);
                Ok(token.text)
            }
            TokenKind::Number => {
                self.advance();
                self.reduce(Production::TermNumber);
                Ok(token.text)
            }
            TokenKind::Quote => {
                self.enter(token)?;
                self.advance();
                let inner = self.parse_term()?;
                self.expect(TokenKind::Quote)?;
                self.reduce(Production::QuotedTerm);
                self.leave();
                Ok(inner)
            }
            _ => Err(unexpected(token)),
        }
    }

    /// Turns a parsed term into a token, or a prefix if a `*` follows.
    fn finish_term(&mut self, text: &str) -> QueryNode {
        if self.peek_kind() == TokenKind::Star {
            self.advance();
            self.reduce(Production::Prefix);
            grammar::prefix(text)
        } else {
            self.reduce(Production::ExprTerm);
            grammar::term(text)
        }
    }

    /// quoted → QUOTE term QUOTE | QUOTE termlist QUOTE
    ///
    /// Inside a phrase a quote always closes it.
    fn parse_quoted(&mut self) -> Result<QueryNode, QueryError> {
        self.advance(); // consume opening "
        let first = self.parse_term()?;

        let next = self.tokens.peek();
        match next.kind {
            TokenKind::Quote => {
                self.advance();
                self.reduce(Production::QuotedTerm);
                Ok(self.finish_term(first))
            }
            TokenKind::Term | TokenKind::Number => {
                let second = self.parse_term()?;
                let mut list = grammar::termlist_start(first, second);
                self.reduce(Production::TermListStart);

                loop {
                    let token = self.tokens.peek();
                    match token.kind {
                        TokenKind::Term | TokenKind::Number => {
                            let text = self.parse_term()?;
                            grammar::termlist_append(&mut list, text);
                            self.reduce(Production::TermListAppend);
                        }
                        TokenKind::Stopword => {
                            self.advance();
                            self.reduce(Production::TermListStopword);
                        }
                        TokenKind::Quote => {
                            self.advance();
                            self.reduce(Production::ExactPhrase);
                            return Ok(grammar::exact_phrase(list));
                        }
                        _ => return Err(unexpected(token)),
                    }
                }
            }
            _ => Err(unexpected(next)),
        }
    }

    /// scoped → modifier COLON (expr | TERM | tag_list | numeric_range | geo_filter)
    ///        | modifierlist COLON expr
    fn parse_scoped(&mut self) -> Result<Option<QueryNode>, QueryError> {
        let field = self.advance().text;
        self.reduce(Production::Modifier);

        if self.peek_kind() == TokenKind::Or {
            return self.parse_multi_scoped(field);
        }

        self.expect(TokenKind::Colon)?;
        match self.peek_kind() {
            TokenKind::Lb => Ok(Some(self.parse_tag(field)?)),
            TokenKind::Lsqb => Ok(Some(self.parse_range(field)?)),
            TokenKind::Term => {
                let text = self.advance().text;
                let mask = self.field_mask(field);
                if self.peek_kind() == TokenKind::Star {
                    self.reduce(Production::TermTerm);
                    let node = self.finish_term(text);
                    self.reduce(Production::ScopedExpr);
                    Ok(Some(node.with_mask(mask)))
                } else {
                    self.reduce(Production::ScopedTerm);
                    Ok(Some(grammar::term(text).with_mask(mask)))
                }
            }
            _ => {
                let expr = self.parse_unary()?;
                self.reduce(Production::ScopedExpr);
                Ok(grammar::scope(expr, self.field_mask(field)))
            }
        }
    }

    /// modifierlist COLON expr, with the first modifier already consumed.
    fn parse_multi_scoped(&mut self, first: &'q str) -> Result<Option<QueryNode>, QueryError> {
        let mut fields = vec![first];

        self.advance(); // consume |
        fields.push(self.parse_term()?);
        self.reduce(Production::ModifierListStart);

        while self.peek_kind() == TokenKind::Or {
            self.advance();
            fields.push(self.parse_term()?);
            self.reduce(Production::ModifierListAppend);
        }

        self.expect(TokenKind::Colon)?;
        let expr = self.parse_unary()?;
        self.reduce(Production::MultiScopedExpr);

        let mask = fields
            .iter()
            .fold(FieldMask::NONE, |mask, name| mask | self.field_mask(name));
        Ok(grammar::scope(expr, mask))
    }

    /// tag_list → LB element (COMMA element | RB)*
    fn parse_tag(&mut self, field: &str) -> Result<QueryNode, QueryError> {
        self.advance(); // consume {
        let (first, is_list) = self.parse_tag_element()?;
        self.reduce(if is_list {
            Production::TagListTermList
        } else {
            Production::TagListTerm
        });
        let mut list = grammar::tag_list_start(first);

        loop {
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                    let (element, is_list) = self.parse_tag_element()?;
                    grammar::tag_list_append(&mut list, element);
                    self.reduce(if is_list {
                        Production::TagListAppendTermList
                    } else {
                        Production::TagListAppendTerm
                    });
                }
                TokenKind::Rb => {
                    self.advance();
                    self.reduce(Production::TagListClose);
                }
                _ => break,
            }
        }

        self.reduce(Production::Tag);
        Ok(grammar::tag(field, list))
    }

    /// A single tag value: a term, or a termlist of adjacent terms.
    ///
    /// Returns the node and whether it is a termlist.
    fn parse_tag_element(&mut self) -> Result<(QueryNode, bool), QueryError> {
        let first = self.parse_term()?;
        if !starts_term(self.peek_kind()) {
            return Ok((grammar::term(first), false));
        }

        let second = self.parse_term()?;
        let mut list = grammar::termlist_start(first, second);
        self.reduce(Production::TermListStart);

        loop {
            match self.peek_kind() {
                kind if starts_term(kind) => {
                    let text = self.parse_term()?;
                    grammar::termlist_append(&mut list, text);
                    self.reduce(Production::TermListAppend);
                }
                TokenKind::Stopword => {
                    self.advance();
                    self.reduce(Production::TermListStopword);
                }
                _ => return Ok((list, true)),
            }
        }
    }

    /// numeric_range → LSQB num num RSQB
    /// geo_filter → LSQB num num num TERM RSQB
    fn parse_range(&mut self, field: &str) -> Result<QueryNode, QueryError> {
        let open = self.advance(); // consume [
        let first = self.parse_num()?;
        let second = self.parse_num()?;

        if self.peek_kind() == TokenKind::Rsqb {
            self.advance();
            self.reduce(Production::NumericRange);
            self.reduce(Production::Numeric);
            return Ok(grammar::numeric(field, first, second));
        }

        let radius = self.parse_num()?;
        let unit = self.expect(TokenKind::Term)?;
        self.expect(TokenKind::Rsqb)?;

        let filter = grammar::geo_filter(field, first, second, radius, unit.text);
        if let Err(message) = self.schema.validate_geo_filter(&filter) {
            debug!(offset = open.offset, "invalid geo filter: {message}");
            if self.invalid_filter.is_none() {
                self.invalid_filter = Some(QueryError::InvalidFilter {
                    message,
                    offset: open.offset,
                });
            }
        }
        self.reduce(Production::GeoFilter);
        self.reduce(Production::Geo);
        Ok(QueryNode::geo(filter))
    }

    /// num → NUMBER | LP num | MINUS num
    fn parse_num(&mut self) -> Result<Num, QueryError> {
        let mut prefixes = Vec::new();

        let mut num = loop {
            let token = self.tokens.peek();
            match token.kind {
                TokenKind::Lp | TokenKind::Minus => {
                    self.check_depth(self.depth + prefixes.len() + 1, token)?;
                    self.advance();
                    prefixes.push(token.kind);
                }
                TokenKind::Number => {
                    self.advance();
                    self.reduce(Production::NumNumber);
                    break Num::new(token.value);
                }
                _ => return Err(unexpected(token)),
            }
        };

        for kind in prefixes.into_iter().rev() {
            if kind == TokenKind::Lp {
                self.reduce(Production::NumExclusive);
                num = num.exclusive();
            } else {
                self.reduce(Production::NumNegate);
                num = num.negate();
            }
        }
        Ok(num)
    }
}

/// Syntax error for a token no rule accepts.
fn unexpected(token: Token<'_>) -> QueryError {
    QueryError::syntax(token.offset, token.text)
}

/// Returns true for tokens that can begin an expression.
fn starts_expr(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Term
            | TokenKind::Number
            | TokenKind::Quote
            | TokenKind::Minus
            | TokenKind::Tilde
            | TokenKind::Modifier
            | TokenKind::Lp
            | TokenKind::Stopword
    )
}

/// Returns true for tokens that can begin a term.
fn starts_term(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Term | TokenKind::Number | TokenKind::Quote
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{GeoFilter, NodeKind, NumericFilter},
        lexer::{Stopwords, tokenize},
        schema::IndexSchema,
        trace::RecordingTracer,
    };

    /// Fields used by most tests: title=1, body=2, tags=4, price=8, loc=16.
    fn schema() -> IndexSchema {
        IndexSchema::new(["title", "body", "tags", "price", "loc"]).unwrap()
    }

    /// Keeps single letters usable as terms.
    fn stopwords() -> Stopwords {
        Stopwords::custom(["the", "of"])
    }

    fn parse(query: &str) -> Result<Option<QueryNode>, QueryError> {
        let schema = schema();
        let tokens = tokenize(query, &stopwords()).unwrap();
        Parser::new(&schema).parse_tokens(tokens)
    }

    fn root(query: &str) -> QueryNode {
        parse(query).unwrap().unwrap()
    }

    fn token(text: &str) -> QueryNode {
        QueryNode::token(text)
    }

    fn phrase(children: Vec<QueryNode>) -> QueryNode {
        QueryNode::phrase_from(children)
    }

    fn union(children: Vec<QueryNode>) -> QueryNode {
        QueryNode::union_from(children)
    }

    fn mask(bits: u64) -> FieldMask {
        FieldMask::from_bits(bits)
    }

    #[test]
    fn empty_query() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn single_term() {
        assert_eq!(root("Hello"), token("hello"));
    }

    #[test]
    fn term_sequence_is_one_phrase() {
        assert_eq!(
            root("a b c"),
            phrase(vec![token("a"), token("b"), token("c")])
        );
    }

    #[test]
    fn union_chain_is_flat() {
        assert_eq!(
            root("a|b|c"),
            union(vec![token("a"), token("b"), token("c")])
        );
    }

    #[test]
    fn grouped_union_is_reused() {
        assert_eq!(
            root("(a|b)|c"),
            union(vec![token("a"), token("b"), token("c")])
        );
    }

    #[test]
    fn intersection_binds_tighter_than_union() {
        assert_eq!(
            root("a b|c"),
            union(vec![phrase(vec![token("a"), token("b")]), token("c")])
        );
        assert_eq!(
            root("a|b c"),
            union(vec![token("a"), phrase(vec![token("b"), token("c")])])
        );
    }

    #[test]
    fn negation_and_optional() {
        assert_eq!(root("-a"), QueryNode::not(token("a")));
        assert_eq!(root("~a"), QueryNode::optional(token("a")));
    }

    #[test]
    fn negation_applies_to_next_expression() {
        assert_eq!(
            root("-a b"),
            phrase(vec![QueryNode::not(token("a")), token("b")])
        );
        assert_eq!(
            root("-(a b)"),
            QueryNode::not(phrase(vec![token("a"), token("b")]))
        );
    }

    #[test]
    fn optional_takes_rest_of_expression() {
        assert_eq!(
            root("~a b"),
            QueryNode::optional(phrase(vec![token("a"), token("b")]))
        );
        assert_eq!(
            root("a ~b c"),
            phrase(vec![
                token("a"),
                QueryNode::optional(phrase(vec![token("b"), token("c")])),
            ])
        );
        assert_eq!(
            root("~a|b"),
            QueryNode::optional(union(vec![token("a"), token("b")]))
        );
    }

    #[test]
    fn optional_stops_at_closing_paren() {
        assert_eq!(
            root("(~a b) c"),
            phrase(vec![
                QueryNode::optional(phrase(vec![token("a"), token("b")])),
                token("c"),
            ])
        );
    }

    #[test]
    fn scoped_optional() {
        assert_eq!(
            root("@title:~a b"),
            QueryNode::optional(phrase(vec![token("a"), token("b")])).with_mask(mask(1))
        );
    }

    #[test]
    fn field_scope() {
        assert_eq!(root("@title:hello"), token("hello").with_mask(mask(1)));
    }

    #[test]
    fn field_scope_binds_tightest() {
        assert_eq!(
            root("@title:a b"),
            phrase(vec![token("a").with_mask(mask(1)), token("b")])
        );
    }

    #[test]
    fn field_scope_on_group() {
        assert_eq!(
            root("@body:(a|b)"),
            union(vec![token("a"), token("b")]).with_mask(mask(2))
        );
    }

    #[test]
    fn scoped_phrase_is_not_extended() {
        assert_eq!(
            root("@title:(a b) c"),
            phrase(vec![
                phrase(vec![token("a"), token("b")]).with_mask(mask(1)),
                token("c"),
            ])
        );
    }

    #[test]
    fn modifier_list() {
        assert_eq!(
            root("@title|body:hello"),
            token("hello").with_mask(mask(3))
        );
        assert_eq!(
            root("@title|body|loc:hello"),
            token("hello").with_mask(mask(19))
        );
    }

    #[test]
    fn unknown_field_gives_empty_mask() {
        assert_eq!(root("@nope:hello"), token("hello").with_mask(FieldMask::NONE));
        assert_eq!(
            root("@nope|title:hello"),
            token("hello").with_mask(mask(1))
        );
    }

    #[test]
    fn field_names_keep_case() {
        assert_eq!(
            root("@Title:hello"),
            token("hello").with_mask(FieldMask::NONE)
        );
    }

    #[test]
    fn exact_phrase() {
        let mut expected = phrase(vec![token("hello"), token("world")]);
        expected.set_exact();
        assert_eq!(root("\"Hello World\""), expected);
    }

    #[test]
    fn quoted_single_term() {
        assert_eq!(root("\"hello\""), token("hello"));
        assert_eq!(root("\"hel\"*"), QueryNode::prefix("hel"));
    }

    #[test]
    fn exact_phrase_is_not_extended() {
        let mut quoted = phrase(vec![token("a"), token("b")]);
        quoted.set_exact();
        assert_eq!(root("\"a b\" c"), phrase(vec![quoted, token("c")]));
    }

    #[test]
    fn prefix() {
        assert_eq!(root("hel*"), QueryNode::prefix("hel"));
        assert_eq!(
            root("@title:Hel*"),
            QueryNode::prefix("hel").with_mask(mask(1))
        );
    }

    #[test]
    fn stopwords_are_dropped() {
        assert_eq!(root("the cat"), token("cat"));
        assert_eq!(root("cat the"), token("cat"));
        assert_eq!(parse("the").unwrap(), None);
        assert_eq!(parse("the of").unwrap(), None);
    }

    #[test]
    fn stopword_operands() {
        assert_eq!(parse("-the").unwrap(), None);
        assert_eq!(parse("~the").unwrap(), None);
        assert_eq!(parse("@title:the").unwrap(), None);
        assert_eq!(root("the|cat"), token("cat"));
        assert_eq!(parse("the|of").unwrap(), None);
    }

    #[test]
    fn numbers_are_terms() {
        assert_eq!(root("2024"), token("2024"));
        assert_eq!(root("@title:10"), token("10").with_mask(mask(1)));
    }

    #[test]
    fn numeric_range() {
        assert_eq!(
            root("@price:[10 20]"),
            QueryNode::numeric(NumericFilter {
                field: "price".into(),
                min: 10.0,
                max: 20.0,
                min_inclusive: true,
                max_inclusive: true,
            })
        );
    }

    #[test]
    fn numeric_range_exclusive_and_negative() {
        let node = root("@price:[(10 (-20]");
        let NodeKind::Numeric { filter } = &node.kind else {
            panic!("expected numeric, got {node:?}");
        };
        assert!(!filter.min_inclusive);
        assert!(!filter.max_inclusive);
        assert_eq!(filter.max, -20.0);

        let node = root("@price:[- 5 inf]");
        let NodeKind::Numeric { filter } = &node.kind else {
            panic!("expected numeric, got {node:?}");
        };
        assert_eq!(filter.min, -5.0);
        assert_eq!(filter.max, f64::INFINITY);
    }

    #[test]
    fn numeric_field_keeps_case() {
        let node = root("@Price:[1 2]");
        let NodeKind::Numeric { filter } = &node.kind else {
            panic!("expected numeric, got {node:?}");
        };
        assert_eq!(filter.field, "Price");
    }

    #[test]
    fn geo_filter() {
        assert_eq!(
            root("@loc:[-1.1 2.2 3 KM]"),
            QueryNode::geo(GeoFilter {
                property: "loc".into(),
                lon: -1.1,
                lat: 2.2,
                radius: 3.0,
                unit: "km".into(),
            })
        );
    }

    #[test]
    fn invalid_geo_filter_consumes_everything() {
        let schema = schema();
        let tokens = tokenize("@loc:[1 2 3 parsecs] more terms", &stopwords()).unwrap();
        let count = tokens.len();
        let mut tracer = RecordingTracer::new();
        let err = Parser::new(&schema)
            .with_tracer(&mut tracer)
            .parse_tokens(tokens)
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid GeoFilter unit");
        assert_eq!(err.offset(), 5);
        let inputs = tracer
            .lines()
            .iter()
            .filter(|line| line.starts_with("input "))
            .count();
        assert_eq!(inputs, count - 1);
        assert!(tracer.reductions().any(|rule| rule == "query ::= expr"));
    }

    #[test]
    fn first_invalid_filter_wins() {
        let err = parse("@loc:[1 2 3 parsecs] @loc:[1 2 -3 km]").unwrap_err();
        assert_eq!(err.to_string(), "Invalid GeoFilter unit");
    }

    #[test]
    fn syntax_error_supersedes_invalid_filter() {
        let err = parse("@loc:[1 2 3 parsecs] )").unwrap_err();
        assert_eq!(err, QueryError::syntax(21, ")"));
    }

    #[test]
    fn tag_list() {
        assert_eq!(
            root("@tags:{a,b,c}"),
            QueryNode::tag_from("tags", vec![token("a"), token("b"), token("c")])
        );
    }

    #[test]
    fn tag_list_with_phrases() {
        assert_eq!(
            root("@tags:{New York, Boston}"),
            QueryNode::tag_from(
                "tags",
                vec![phrase(vec![token("new"), token("york")]), token("boston")]
            )
        );
    }

    #[test]
    fn unclosed_tag_list() {
        assert_eq!(
            root("@tags:{a,b"),
            QueryNode::tag_from("tags", vec![token("a"), token("b")])
        );
    }

    #[test]
    fn tag_list_in_context() {
        assert_eq!(
            root("hello @tags:{a} world"),
            phrase(vec![
                token("hello"),
                QueryNode::tag_from("tags", vec![token("a")]),
                token("world"),
            ])
        );
    }

    #[test]
    fn dangling_modifier() {
        let err = parse("@title:").unwrap_err();
        assert_eq!(err, QueryError::syntax(7, ""));
        assert_eq!(err.to_string(), "Syntax error at offset 7 near ''");
    }

    #[test]
    fn unbalanced_parentheses() {
        assert_eq!(parse("a )").unwrap_err(), QueryError::syntax(2, ")"));
        assert_eq!(parse("(a b").unwrap_err(), QueryError::syntax(4, ""));
    }

    #[test]
    fn dangling_union() {
        assert_eq!(parse("a |").unwrap_err(), QueryError::syntax(3, ""));
        assert_eq!(parse("| a").unwrap_err(), QueryError::syntax(0, "|"));
    }

    #[test]
    fn unterminated_phrase() {
        assert_eq!(parse("\"a b").unwrap_err(), QueryError::syntax(4, ""));
    }

    #[test]
    fn malformed_range() {
        assert_eq!(
            parse("@price:[1 x]").unwrap_err(),
            QueryError::syntax(10, "x")
        );
        assert_eq!(
            parse("@loc:[1 2 3 4]").unwrap_err(),
            QueryError::syntax(12, "4")
        );
    }

    #[test]
    fn modifier_without_colon() {
        assert_eq!(parse("@title a").unwrap_err(), QueryError::syntax(7, "a"));
    }

    #[test]
    fn nesting_limit() {
        let schema = schema();
        let options = ParserOptions { max_depth: 3 };
        let mut parser = Parser::new(&schema).with_options(options);

        let ok = tokenize("((a))", &stopwords()).unwrap();
        assert!(parser.parse_tokens(ok).is_ok());

        let deep = tokenize("(((a)))", &stopwords()).unwrap();
        assert_eq!(
            parser.parse_tokens(deep).unwrap_err(),
            QueryError::StackOverflow {
                limit: 3,
                offset: 3
            }
        );

        let negations = tokenize("---a", &stopwords()).unwrap();
        assert!(matches!(
            parser.parse_tokens(negations),
            Err(QueryError::StackOverflow { .. })
        ));
    }

    #[test]
    fn default_limit_allows_deep_queries() {
        let query = format!("{}a{}", "(".repeat(99), ")".repeat(99));
        assert!(parse(&query).is_ok());

        let query = format!("{}a{}", "(".repeat(100), ")".repeat(100));
        assert!(matches!(
            parse(&query),
            Err(QueryError::StackOverflow { limit: 100, .. })
        ));
    }

    #[test]
    fn huge_limit_is_clamped() {
        let schema = schema();
        let options = ParserOptions {
            max_depth: usize::MAX,
        };
        let mut parser = Parser::new(&schema).with_options(options);
        assert_eq!(parser.options().max_depth, MAX_DEPTH_LIMIT);

        for query in [
            format!("{}a", "(".repeat(500_000)),
            format!("{}a", "-".repeat(500_000)),
            format!("{}a", "~".repeat(500_000)),
        ] {
            let tokens = tokenize(&query, &stopwords()).unwrap();
            assert!(matches!(
                parser.parse_tokens(tokens),
                Err(QueryError::StackOverflow {
                    limit: MAX_DEPTH_LIMIT,
                    ..
                })
            ));
        }
    }

    #[test]
    fn limit_below_cap_is_kept() {
        let options = ParserOptions { max_depth: 7 };
        assert_eq!(options.clamped(), options);
        let schema = schema();
        let parser = Parser::new(&schema).with_options(options);
        assert_eq!(parser.options().max_depth, 7);
    }

    #[test]
    fn missing_end_token_is_synthesized() {
        let schema = schema();
        let tokens = vec![
            Token::new(TokenKind::Modifier, "title", 1),
            Token::new(TokenKind::Colon, ":", 6),
        ];
        assert_eq!(
            Parser::new(&schema).parse_tokens(tokens).unwrap_err(),
            QueryError::syntax(7, "")
        );

        let tokens = vec![Token::new(TokenKind::Term, "a", 0)];
        assert_eq!(
            Parser::new(&schema).parse_tokens(tokens).unwrap(),
            Some(token("a"))
        );
        assert_eq!(Parser::new(&schema).parse_tokens(Vec::new()).unwrap(), None);
    }

    #[test]
    fn tokens_after_end_are_ignored() {
        let schema = schema();
        let tokens = vec![
            Token::new(TokenKind::Term, "a", 0),
            Token::end(1),
            Token::new(TokenKind::Rp, ")", 2),
        ];
        assert_eq!(
            Parser::new(&schema).parse_tokens(tokens).unwrap(),
            Some(token("a"))
        );
    }

    #[test]
    fn parser_is_reusable() {
        let schema = schema();
        let mut parser = Parser::new(&schema);
        for query in ["a b", "@title:x", ")", "c|d"] {
            let tokens = tokenize(query, &stopwords()).unwrap();
            assert_eq!(parser.parse_tokens(tokens).is_ok(), query != ")");
        }
        let tokens = tokenize("z", &stopwords()).unwrap();
        assert_eq!(parser.parse_tokens(tokens).unwrap(), Some(token("z")));
    }

    #[test]
    fn reductions_are_traced() {
        let schema = schema();
        let tokens = tokenize("a b", &stopwords()).unwrap();
        let mut parser = Parser::new(&schema).with_tracer(RecordingTracer::new());
        parser.parse_tokens(tokens).unwrap();

        assert_eq!(
            parser.tracer().reductions().collect::<Vec<_>>(),
            vec![
                "term ::= TERM",
                "expr ::= term",
                "term ::= TERM",
                "expr ::= term",
                "expr ::= expr expr",
                "query ::= expr",
            ]
        );
        assert_eq!(parser.tracer().lines().last().unwrap(), "accept");
    }

    #[test]
    fn failures_are_traced() {
        let schema = schema();
        let tokens = tokenize("a )", &stopwords()).unwrap();
        let mut parser = Parser::new(&schema).with_tracer(RecordingTracer::new());
        assert!(parser.parse_tokens(tokens).is_err());
        assert_eq!(
            parser.tracer().lines().last().unwrap(),
            "fail Syntax error at offset 2 near ')'"
        );
    }

    #[test]
    fn numeric_range_reductions() {
        let schema = schema();
        let tokens = tokenize("@price:[(-1 2]", &stopwords()).unwrap();
        let mut parser = Parser::new(&schema).with_tracer(RecordingTracer::new());
        parser.parse_tokens(tokens).unwrap();

        let rules: Vec<_> = parser.tracer().reductions().collect();
        assert_eq!(
            rules,
            vec![
                "modifier ::= MODIFIER",
                "num ::= NUMBER",
                "num ::= LP num",
                "num ::= NUMBER",
                "numeric_range ::= LSQB num num RSQB",
                "expr ::= modifier COLON numeric_range",
                "query ::= expr",
            ]
        );
    }
}
