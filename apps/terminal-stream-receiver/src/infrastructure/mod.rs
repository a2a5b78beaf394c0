//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the transport and ambient
//! services around them.

/// Trading terminal message codec and console formatting.
pub mod terminal;

/// WebSocket listener and handshake.
pub mod server;

/// Line sink adapters (stdout, in-memory).
pub mod output;

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing and OpenTelemetry integration.
pub mod telemetry;
