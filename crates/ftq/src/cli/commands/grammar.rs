//! Implementation of `ftq grammar`.

use std::process::ExitCode;

use ftq_query::Production;

use crate::cli::output::dim;

/// Prints every production with its rule number.
pub fn run() -> ExitCode {
    for production in Production::ALL {
        println!("{} {}", dim(&format!("{:>2}", production.index())), production.text());
    }
    ExitCode::SUCCESS
}
