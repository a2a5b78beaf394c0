//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the session service and the output port it writes
//! rendered lines through.

/// Port interfaces for external systems (console output).
pub mod ports;

/// Application services for connection sessions.
pub mod services;
