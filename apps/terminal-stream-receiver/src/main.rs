//! Terminal Stream Receiver Binary
//!
//! Starts the WebSocket endpoint and prints one line per received event.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin terminal-stream-receiver
//! ```
//!
//! # Environment Variables
//!
//! - `RECEIVER_HOST`: Listen host (default: 127.0.0.1)
//! - `RECEIVER_PORT`: Listen port (default: 7681)
//! - `RECEIVER_ALLOWED_ORIGINS`: `*` or comma-separated origins (default: *)
//! - `RECEIVER_HEALTH_PORT`: Health/metrics HTTP port, 0 disables (default: 0)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: terminal-stream-receiver)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use terminal_stream_receiver::infrastructure::telemetry;
use terminal_stream_receiver::infrastructure::terminal::{calendar_stamp, startup_banner};
use terminal_stream_receiver::{
    ConsoleSink, HealthServer, HealthServerState, LineSink, ReceiverConfig, ReceiverServer,
    init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Terminal Stream Receiver");

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Metrics recorder not installed");
    }

    let config = ReceiverConfig::from_env().context("invalid receiver configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let sink: Arc<dyn LineSink> = Arc::new(ConsoleSink::new());

    let server = ReceiverServer::new(config.clone(), Arc::clone(&sink), shutdown_token.clone());
    let listener = server
        .bind()
        .await
        .context("failed to start WebSocket listener")?;

    sink.emit_all(&startup_banner(
        &config.ws_endpoint(),
        &calendar_stamp(&Local::now()),
    ));

    if config.server.health_port != 0 {
        let health_state = Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            config.ws_endpoint(),
        ));
        let health_server = HealthServer::new(
            config.server.health_port,
            health_state,
            shutdown_token.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = health_server.run().await {
                tracing::error!(error = %e, "Health server error");
            }
        });
    }

    let server_handle = tokio::spawn(server.serve(listener));

    await_shutdown(shutdown_token).await;

    if let Err(e) = server_handle.await {
        tracing::error!(error = %e, "Listener task failed");
    }

    tracing::info!("Terminal Stream Receiver stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &ReceiverConfig) {
    tracing::info!(
        endpoint = %config.ws_endpoint(),
        health_port = config.server.health_port,
        "Configuration loaded"
    );
    tracing::debug!(origins = ?config.origins, "Origin policy");
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
