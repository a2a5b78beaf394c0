//! Domain Layer - Terminal event and session types.
//!
//! This layer contains the decoded event shapes and per-connection session
//! state. Types here carry serialization support but no I/O.

/// Tick and trade event types.
pub mod events;

/// Per-connection session state and counters.
pub mod session;
