//! Implementation of `ftq parse`.

use std::process::ExitCode;

use ftq_query::{LogTracer, Parser, tokenize};
use tracing::debug;

use crate::cli::{
    args::ParseCommand,
    context::CommandContext,
    output::{output_tree, report_query_error},
};

/// Parses the query against the schema and prints the resulting tree.
pub fn run(ctx: &CommandContext, cmd: &ParseCommand) -> ExitCode {
    let schema = match ctx.schema(&cmd.fields) {
        Ok(schema) => schema,
        Err(code) => return code,
    };

    let mut options = ctx.config.parser_options();
    if let Some(max_depth) = cmd.max_depth {
        options.max_depth = max_depth;
    }

    let tokens = match tokenize(&cmd.query, &ctx.config.stopwords()) {
        Ok(tokens) => tokens,
        Err(e) => return report_query_error(&cmd.query, &e),
    };
    debug!(tokens = tokens.len(), max_depth = options.max_depth, "parsing");

    let mut parser = Parser::new(&schema).with_options(options);
    let result = if cmd.trace {
        parser.with_tracer(LogTracer).parse_tokens(tokens)
    } else {
        parser.parse_tokens(tokens)
    };

    match result {
        Ok(root) => output_tree(&cmd.query, root.as_ref(), cmd.json),
        Err(e) => report_query_error(&cmd.query, &e),
    }
}
