//! Rendering and JSON serialization for CLI output.

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
pub use ftq_highlight::{dim, header, subheader, success, warning};
use ftq_highlight::{Highlighter, diagnostic};
use ftq_query::{QueryError, QueryNode, Token, TokenKind};
use serde::Serialize;

/// JSON output for `ftq parse`.
#[derive(Serialize)]
struct JsonParseOutput<'a> {
    /// The query as given.
    query: &'a str,
    /// Root of the tree, `null` for an empty query.
    root: Option<&'a QueryNode>,
}

/// Prints a parsed tree, or a note when the query has nothing to search for.
pub fn output_tree(query: &str, root: Option<&QueryNode>, json: bool) -> ExitCode {
    if json {
        return output_json(&JsonParseOutput { query, root });
    }

    match root {
        Some(node) => print!("{node}"),
        None => println!("{}", dim("(empty query)")),
    }
    ExitCode::SUCCESS
}

/// Prints tokens as a table, or as JSON.
pub fn output_tokens(tokens: &[Token<'_>], json: bool) -> ExitCode {
    if json {
        return output_json(tokens);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "Kind", "Offset", "Text", "Value"]);
    for (i, token) in tokens.iter().enumerate() {
        let value = if token.kind == TokenKind::Number {
            token.value.to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            Cell::new(i),
            Cell::new(token.kind),
            Cell::new(token.offset),
            Cell::new(token.text),
            Cell::new(value),
        ]);
    }
    println!("{table}");
    ExitCode::SUCCESS
}

/// Serializes `value` as pretty JSON, highlighted when stdout is a terminal.
fn output_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json_str) => {
            if io::stdout().is_terminal() {
                println!("{}", Highlighter::new().highlight_json(&json_str));
            } else {
                println!("{json_str}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Reports a failed parse with a pointer into the query.
pub fn report_query_error(query: &str, error: &QueryError) -> ExitCode {
    eprintln!("{}", diagnostic(&error.render(query)));
    ExitCode::FAILURE
}
