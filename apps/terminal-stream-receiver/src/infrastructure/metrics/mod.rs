//! Prometheus Metrics Module
//!
//! Exposes receiver metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Sessions**: connections opened, closed, and failed upgrades
//! - **Messages**: classified messages by kind, decode errors by stage
//! - **Latency**: per-message classify/format/write time
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! before [`init_metrics`] is a no-op.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::events::MessageKind;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if the global recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "terminal_receiver_sessions_opened_total",
        "Total terminal connections upgraded"
    );
    describe_counter!(
        "terminal_receiver_sessions_closed_total",
        "Total terminal sessions closed"
    );
    describe_gauge!(
        "terminal_receiver_active_sessions",
        "Terminal sessions currently reading"
    );
    describe_counter!(
        "terminal_receiver_upgrade_failures_total",
        "Total failed WebSocket handshakes"
    );
    describe_counter!(
        "terminal_receiver_messages_total",
        "Total messages classified, by kind"
    );
    describe_counter!(
        "terminal_receiver_decode_errors_total",
        "Total messages skipped as malformed, by stage"
    );
    describe_histogram!(
        "terminal_receiver_message_processing_seconds",
        "Time to classify, format and write one message"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a session entering the active state.
pub fn record_session_opened() {
    counter!("terminal_receiver_sessions_opened_total").increment(1);
    gauge!("terminal_receiver_active_sessions").increment(1.0);
}

/// Record a session reaching the closed state.
pub fn record_session_closed() {
    counter!("terminal_receiver_sessions_closed_total").increment(1);
    gauge!("terminal_receiver_active_sessions").decrement(1.0);
}

/// Record a failed handshake.
pub fn record_upgrade_failure() {
    counter!("terminal_receiver_upgrade_failures_total").increment(1);
}

/// Record a classified message.
pub fn record_message(kind: &MessageKind) {
    counter!(
        "terminal_receiver_messages_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a message dropped by the decoder.
pub fn record_decode_error(stage: &'static str) {
    counter!(
        "terminal_receiver_decode_errors_total",
        "stage" => stage
    )
    .increment(1);
}

/// Record message processing duration.
pub fn record_processing_duration(duration: Duration) {
    histogram!("terminal_receiver_message_processing_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
