//! Full-text query parsing.
//!
//! This crate turns search queries into a tree of [`QueryNode`]s ready to be evaluated
//! against an inverted index:
//!
//! - **Terms**: `rust` - words that must appear
//! - **Intersection**: `rust async` - all of the expressions must match
//! - **Union**: `rust|golang` - alternatives
//! - **Negation**: `-deprecated` - expressions that must NOT match
//! - **Optional**: `~tutorial` - expressions that only affect ranking
//! - **Phrases**: `"error handling"` - exact sequences
//! - **Prefixes**: `hel*` - terms starting with a prefix
//! - **Fields**: `@title:guide`, `@title|body:guide` - restrict to fields
//! - **Tags**: `@tags:{rust, web dev}` - tag field values
//! - **Ranges**: `@price:[(10 100]` - numeric ranges, `@loc:[-0.1 51.5 5 km]` - geo radius
//! - **Grouping**: `(a b)|(c d)` - precedence control
//!
//! Stopwords such as `the` are dropped from the tree.
//!
//! # Example
//!
//! ```
//! use ftq_query::{IndexSchema, NodeKind, parse};
//!
//! let schema = IndexSchema::new(["title", "body"]).unwrap();
//! let root = parse("@title:guide (rust|golang) -deprecated", &schema).unwrap();
//! assert!(matches!(root.unwrap().kind, NodeKind::Phrase { .. }));
//! ```
//!
//! Tokens from another lexer can be fed to a [`Parser`] directly.

mod ast;
mod error;
mod grammar;
mod lexer;
mod normalize;
mod parser;
mod schema;
mod token;
mod trace;

pub use ast::{FieldMask, GeoFilter, NodeKind, NumericFilter, QueryNode};
pub use error::QueryError;
pub use grammar::Production;
pub use lexer::{DEFAULT_STOPWORDS, Stopwords, tokenize};
pub use normalize::normalize;
pub use parser::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, Parser, ParserOptions};
pub use schema::{GeoUnit, IndexSchema, Schema, validate_geo};
pub use token::{Token, TokenKind};
pub use trace::{LogTracer, NoopTracer, RecordingTracer, Tracer};

/// Tokenizes `query` with the default stopwords and parses it against `schema`.
///
/// Returns `Ok(None)` for queries with nothing to search for, such as an empty string or
/// only stopwords.
pub fn parse(query: &str, schema: &dyn Schema) -> Result<Option<QueryNode>, QueryError> {
    let tokens = tokenize(query, &Stopwords::default())?;
    Parser::new(schema).parse_tokens(tokens)
}
