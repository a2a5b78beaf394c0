//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `LineSink`: destination for rendered console lines

/// Append-only destination for rendered lines.
///
/// Shared by every session, so implementations must write each line
/// atomically. Ordering across sessions is not guaranteed.
pub trait LineSink: Send + Sync {
    /// Write one line.
    fn emit(&self, line: &str);

    /// Write a group of lines (a banner) without interleaving where possible.
    fn emit_all(&self, lines: &[String]) {
        for line in lines {
            self.emit(line);
        }
    }
}
