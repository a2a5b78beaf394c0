//! Line Sink Adapters
//!
//! - `ConsoleSink`: standard output, the receiver's only durable artifact
//! - `BufferSink`: in-memory capture for tests and embedding

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::application::ports::LineSink;

/// Writes lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Create a console sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LineSink for ConsoleSink {
    fn emit(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}") {
            tracing::debug!(error = %e, "stdout write failed");
        }
    }

    fn emit_all(&self, lines: &[String]) {
        let mut out = std::io::stdout().lock();
        for line in lines {
            if let Err(e) = writeln!(out, "{line}") {
                tracing::debug!(error = %e, "stdout write failed");
                return;
            }
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl BufferSink {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of lines written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// Check if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl LineSink for BufferSink {
    fn emit(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }

    fn emit_all(&self, lines: &[String]) {
        self.lines.lock().extend(lines.iter().cloned());
    }
}
