//! Implementation of `ftq tokens`.

use std::process::ExitCode;

use ftq_query::tokenize;

use crate::cli::{
    args::TokensCommand,
    context::CommandContext,
    output::{output_tokens, report_query_error},
};

/// Tokenizes the query with the configured stopwords and prints the tokens.
pub fn run(ctx: &CommandContext, cmd: &TokensCommand) -> ExitCode {
    match tokenize(&cmd.query, &ctx.config.stopwords()) {
        Ok(tokens) => output_tokens(&tokens, cmd.json),
        Err(e) => report_query_error(&cmd.query, &e),
    }
}
