//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `Session`: one connection's read loop, counters and summary

mod session;

pub use session::Session;
