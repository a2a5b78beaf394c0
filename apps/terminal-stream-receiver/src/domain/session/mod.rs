//! Session State Types
//!
//! Per-connection lifecycle state and counters. A session starts `Active`
//! when the connection is accepted and ends `Closed` on the first failed
//! read; counters live exactly as long as the session.

use std::time::Duration;

use uuid::Uuid;

use super::events::MessageKind;

/// Unique identifier for one connection session.
pub type SessionId = Uuid;

/// Lifecycle state of a connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Reading messages.
    #[default]
    Active,
    /// Read failed or peer closed; terminal.
    Closed,
}

impl SessionState {
    /// Check if the session has terminated.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Get the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

/// Messages successfully classified during one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionCounters {
    /// Tick messages decoded.
    pub tick_count: u64,
    /// Trade messages decoded (including unrecognized actions).
    pub trade_count: u64,
}

impl SessionCounters {
    /// Create zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            trade_count: 0,
        }
    }

    /// Bump the counter matching a classified message.
    ///
    /// Unknown messages leave both counters untouched.
    pub fn record(&mut self, kind: &MessageKind) {
        match kind {
            MessageKind::Tick(_) => self.tick_count += 1,
            MessageKind::Trade(_) => self.trade_count += 1,
            MessageKind::Unknown(_) => {}
        }
    }
}

/// Final report of a closed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Final counters.
    pub counters: SessionCounters,
    /// Time from accept to close.
    pub duration: Duration,
}
