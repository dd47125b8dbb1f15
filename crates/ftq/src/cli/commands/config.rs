//! Implementation of `ftq config`.

use std::process::ExitCode;

use ftq_highlight::{Highlighter, rule};

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader},
};

/// Shows the contributing config files and the effective settings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    println!("{}", subheader("Config files (highest precedence first):"));
    if config.files.is_empty() {
        println!("   {}", dim("(none, using defaults)"));
    }
    for path in &config.files {
        println!("   {}", path.display());
    }
    println!();

    let settings = match config.settings_to_toml() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", subheader("Effective settings:"));
    println!("{}", rule(40));
    print!("{}", Highlighter::new().highlight_toml(&settings));
    println!("{}", rule(40));
    ExitCode::SUCCESS
}
