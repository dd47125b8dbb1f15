//! Parser instrumentation.
//!
//! The parser reports every token it consumes and every production it reduces to a
//! [`Tracer`]. [`NoopTracer`] is the default and is optimized away entirely;
//! [`LogTracer`] forwards events to the `tracing` crate at `TRACE` level.

use tracing::trace;

use crate::{error::QueryError, grammar::Production, token::Token};

/// Receives parser events.
///
/// Each method is called at a specific point during a parse:
/// - `trace_input` - when a token is consumed
/// - `trace_reduce` - after a production's action has run
/// - `trace_accept` - when the whole input has been reduced
/// - `trace_error` - when the parse fails
pub trait Tracer {
    /// Called when the parser consumes `token`.
    fn trace_input(&mut self, token: &Token<'_>);

    /// Called after `production` has been reduced.
    fn trace_reduce(&mut self, production: Production);

    /// Called when parsing completes successfully.
    fn trace_accept(&mut self);

    /// Called when parsing stops with `error`.
    fn trace_error(&mut self, error: &QueryError);
}

/// No-op tracer that gets optimized away completely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_input(&mut self, _token: &Token<'_>) {}

    #[inline(always)]
    fn trace_reduce(&mut self, _production: Production) {}

    #[inline(always)]
    fn trace_accept(&mut self) {}

    #[inline(always)]
    fn trace_error(&mut self, _error: &QueryError) {}
}

/// Tracer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace_input(&mut self, token: &Token<'_>) {
        trace!(kind = %token.kind, text = token.text, offset = token.offset, "input");
    }

    fn trace_reduce(&mut self, production: Production) {
        trace!(rule = production.index(), "reduce [{production}]");
    }

    fn trace_accept(&mut self) {
        trace!("accept");
    }

    fn trace_error(&mut self, error: &QueryError) {
        trace!(offset = error.offset(), "fail: {error}");
    }
}

/// Tracer that records events as text lines, for tests and inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    /// Recorded lines, in order.
    lines: Vec<String>,
}

impl RecordingTracer {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns only the reductions, as production text.
    pub fn reductions(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter_map(|line| line.strip_prefix("reduce "))
    }
}

impl Tracer for RecordingTracer {
    fn trace_input(&mut self, token: &Token<'_>) {
        self.lines
            .push(format!("input {} {:?}", token.kind, token.text));
    }

    fn trace_reduce(&mut self, production: Production) {
        self.lines.push(format!("reduce {production}"));
    }

    fn trace_accept(&mut self) {
        self.lines.push("accept".to_string());
    }

    fn trace_error(&mut self, error: &QueryError) {
        self.lines.push(format!("fail {error}"));
    }
}

impl<T: Tracer + ?Sized> Tracer for &mut T {
    fn trace_input(&mut self, token: &Token<'_>) {
        (**self).trace_input(token);
    }

    fn trace_reduce(&mut self, production: Production) {
        (**self).trace_reduce(production);
    }

    fn trace_accept(&mut self) {
        (**self).trace_accept();
    }

    fn trace_error(&mut self, error: &QueryError) {
        (**self).trace_error(error);
    }
}
