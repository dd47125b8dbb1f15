//! ftq: full-text query inspector
//!
//! ftq shows how a search query is understood before it reaches an index. It tokenizes
//! queries, parses them into the tree an engine would evaluate, explains failures with a
//! pointer into the query, and manages the `.ftq.toml` files that describe the index schema
//! and parser limits.

#![warn(missing_docs)]

pub mod cli;
