//! Implementation of `ftq check`.

use std::process::ExitCode;

use ftq_config::ConfigWarning;

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, success, warning},
};

/// Validates the configuration and prints warnings with hints.
///
/// Exits with failure when any warning is reported.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    if config.files.is_empty() {
        println!("{}", dim("No configuration files found."));
        println!();
        println!(
            "Run {} to create a configuration file.",
            subheader("ftq init")
        );
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader("Config files:"));
    for path in &config.files {
        println!("   {}", path.display());
    }
    println!();

    println!("{}", subheader("Schema:"));
    if config.schema.fields.is_empty() {
        println!("   {}", dim("(no fields)"));
    }
    for (bit, field) in config.schema.fields.iter().enumerate() {
        println!("   {field} {}", dim(&format!("(bit {bit})")));
    }
    println!();

    println!("{}", subheader("Parser:"));
    println!("   max_depth = {}", config.parser.max_depth);
    match &config.parser.stopwords {
        Some(words) => println!("   stopwords = {} custom", words.len()),
        None => println!("   stopwords = {}", dim("(built-in list)")),
    }
    println!();

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("{}", success("No issues found."));
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("   {}", warning(&w.to_string()));
    }
    println!();

    print_hints(&warnings);

    ExitCode::FAILURE
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .map(|w| match w {
            ConfigWarning::NoFieldsDefined => "Hint: list field names under [schema] fields",
            ConfigWarning::DuplicateField { .. } => {
                "Hint: remove repeated names, a field's position selects its mask bit"
            }
            ConfigWarning::TooManyFields { .. } => "Hint: split the schema, masks hold 64 fields",
            ConfigWarning::ZeroMaxDepth => "Hint: set [parser] max_depth to at least 1",
            ConfigWarning::MaxDepthTooLarge { .. } => {
                "Hint: lower [parser] max_depth, deeper limits are not honoured"
            }
        })
        .collect();
    hints.dedup();

    for hint in hints {
        println!("{}", dim(hint));
    }
}
