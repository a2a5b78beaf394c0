#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Terminal Stream Receiver - Tick & Trade Event Logger
//!
//! A WebSocket endpoint that accepts long-lived connections from a trading
//! terminal, classifies each JSON message by its `type` tag and prints a
//! timestamped, human-readable line per event.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Decoded events and session state
//!   - `events`: Tick and trade event types, message kinds
//!   - `session`: Session state machine, counters, summary
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Output line sink
//!   - `services`: Connection session read loop
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `terminal`: Envelope codec and console formatting
//!   - `server`: WebSocket listener and handshake
//!   - `output`: Console and in-memory sinks
//!   - `config`: Environment configuration
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//!                 ┌────────────┐     ┌─────────────┐     ┌──────────┐
//! Terminal WS ───►│  Session   │────►│  Classifier │────►│ LineSink │──► stdout
//!                 │ (per conn) │◄────│ & Formatter │     └──────────┘
//!                 └────────────┘ kind└─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Event and session types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::events::{Direction, MessageKind, TickEvent, TradeAction, TradeEvent};
pub use domain::session::{SessionCounters, SessionId, SessionState, SessionSummary};

// Application
pub use application::ports::LineSink;
pub use application::services::Session;

// Terminal codec
pub use infrastructure::terminal::{DecodeError, TerminalCodec, format_message};

// Server
pub use infrastructure::server::{
    HandshakeInfo, ReceiverServer, ServerError, UpgradeError, upgrade,
};

// Output sinks
pub use infrastructure::output::{BufferSink, ConsoleSink};

// Infrastructure config
pub use infrastructure::config::{ConfigError, OriginPolicy, ReceiverConfig, ServerSettings};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
