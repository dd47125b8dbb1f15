//! Diagnostic logging to stderr.

use std::io;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` selects what is logged, warnings by default. With `trace_parser` every event is
/// enabled so the parser's token and reduction events show up.
pub fn init(trace_parser: bool) {
    let mut filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();
    if trace_parser {
        filter = filter.add_directive(Level::TRACE.into());
    }

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    if let Err(e) = installed {
        eprintln!("warning: logging disabled: {e}");
    }
}
