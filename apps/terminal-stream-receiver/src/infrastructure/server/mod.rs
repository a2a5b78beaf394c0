//! WebSocket Listener
//!
//! Accepts TCP connections, performs the WebSocket handshake and hands each
//! upgraded connection to its own [`Session`] task. The request path is not
//! inspected; every path reaches the same handler.
//!
//! # Failure Scope
//!
//! - Bind failure is fatal and returned to the caller.
//! - Accept and handshake failures are logged; the listener keeps going.
//! - Session errors never leave their task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{StatusCode, header};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::LineSink;
use crate::application::services::Session;
use crate::infrastructure::config::{OriginPolicy, ReceiverConfig};
use crate::infrastructure::metrics;

/// Back-off after a failed `accept` (e.g. file descriptor exhaustion).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

// =============================================================================
// Errors
// =============================================================================

/// Listener setup errors. These are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        /// Address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Handshake errors. Each one abandons a single connection attempt.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// Origin header not permitted by the configured policy.
    #[error("origin not allowed: {0}")]
    OriginRejected(String),

    /// Malformed handshake or transport failure during the handshake.
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),
}

// =============================================================================
// Handshake
// =============================================================================

/// Request details captured during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeInfo {
    /// Request path (informational only).
    pub path: String,
    /// `Origin` header, when present.
    pub origin: Option<String>,
}

/// Upgrade a raw byte stream to a WebSocket connection.
///
/// # Errors
///
/// Returns [`UpgradeError::OriginRejected`] if the origin policy refuses the
/// request, or [`UpgradeError::Handshake`] if the handshake is malformed or
/// the stream fails.
pub async fn upgrade<S>(
    stream: S,
    policy: &OriginPolicy,
) -> Result<(WebSocketStream<S>, HandshakeInfo), UpgradeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut info = HandshakeInfo::default();
    let mut rejected = false;

    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        info.path = request.uri().path().to_string();
        info.origin = request
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        if policy.permits(info.origin.as_deref()) {
            Ok(response)
        } else {
            rejected = true;
            let mut denied = ErrorResponse::new(Some("origin not allowed".to_string()));
            *denied.status_mut() = StatusCode::FORBIDDEN;
            Err(denied)
        }
    };

    let result = tokio_tungstenite::accept_hdr_async(stream, callback).await;

    match result {
        Ok(ws) => Ok((ws, info)),
        Err(_) if rejected => Err(UpgradeError::OriginRejected(
            info.origin.unwrap_or_default(),
        )),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Server
// =============================================================================

/// Terminal stream listener.
pub struct ReceiverServer {
    config: ReceiverConfig,
    sink: Arc<dyn LineSink>,
    cancel: CancellationToken,
}

impl ReceiverServer {
    /// Create a new server.
    #[must_use]
    pub fn new(config: ReceiverConfig, sink: Arc<dyn LineSink>, cancel: CancellationToken) -> Self {
        Self {
            config,
            sink,
            cancel,
        }
    }

    /// Bind the configured listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the address cannot be bound.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.listen_addr();
        TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::BindFailed { addr, source })
    }

    /// Accept connections on an already bound listener until cancelled.
    pub async fn serve(self, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(addr = %addr, "Receiver listening");
        }

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("Receiver stopped accepting connections");
                    return;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let policy = self.config.origins.clone();
        let sink = Arc::clone(&self.sink);
        let span = tracing::info_span!("connection", peer = %peer);

        tokio::spawn(
            async move {
                handle_connection(stream, &policy, sink).await;
            }
            .instrument(span),
        );
    }
}

async fn handle_connection(stream: TcpStream, policy: &OriginPolicy, sink: Arc<dyn LineSink>) {
    match upgrade(stream, policy).await {
        Ok((ws, info)) => {
            tracing::info!(path = %info.path, origin = ?info.origin, "Terminal connected");
            let summary = Session::new(sink).run(ws).await;
            tracing::debug!(session_id = %summary.session_id, "Connection released");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Upgrade error");
            metrics::record_upgrade_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const HANDSHAKE: &str = "GET /any/path HTTP/1.1\r\n\
        Host: localhost\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n";

    async fn handshake(request: String, policy: OriginPolicy) -> (Result<HandshakeInfo, UpgradeError>, String) {
        let (client, server) = tokio::io::duplex(4096);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        client_write.write_all(request.as_bytes()).await.unwrap();

        let result = upgrade(server, &policy).await.map(|(_, info)| info);

        let mut buf = vec![0u8; 1024];
        let n = client_read.read(&mut buf).await.unwrap();
        (result, String::from_utf8_lossy(&buf[..n]).into_owned())
    }

    #[tokio::test]
    async fn upgrade_accepts_any_path() {
        let (result, reply) = handshake(format!("{HANDSHAKE}\r\n"), OriginPolicy::AcceptAll).await;

        let info = result.unwrap();
        assert_eq!(info.path, "/any/path");
        assert_eq!(info.origin, None);
        assert!(reply.starts_with("HTTP/1.1 101"));
    }

    #[tokio::test]
    async fn upgrade_rejects_foreign_origin() {
        let policy = OriginPolicy::AllowList(vec!["http://localhost:3000".to_string()]);
        let request = format!("{HANDSHAKE}Origin: http://evil.example\r\n\r\n");

        let (result, reply) = handshake(request, policy).await;

        assert!(matches!(result, Err(UpgradeError::OriginRejected(ref o)) if o == "http://evil.example"));
        assert!(reply.starts_with("HTTP/1.1 403"));
    }

    #[tokio::test]
    async fn upgrade_allows_listed_origin() {
        let policy = OriginPolicy::AllowList(vec!["http://localhost:3000".to_string()]);
        let request = format!("{HANDSHAKE}Origin: http://localhost:3000\r\n\r\n");

        let (result, _) = handshake(request, policy).await;

        assert_eq!(result.unwrap().origin.as_deref(), Some("http://localhost:3000"));
    }

    #[tokio::test]
    async fn upgrade_fails_on_plain_http() {
        let request = "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n".to_string();
        let (client, server) = tokio::io::duplex(4096);
        let (_client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(request.as_bytes()).await.unwrap();

        let result = upgrade(server, &OriginPolicy::AcceptAll).await;
        assert!(matches!(result, Err(UpgradeError::Handshake(_))));
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = holder.local_addr().unwrap().port();

        let mut config = ReceiverConfig::default();
        config.server.port = port;
        let server = ReceiverServer::new(
            config,
            Arc::new(crate::infrastructure::output::BufferSink::new()),
            CancellationToken::new(),
        );

        let err = server.bind().await.unwrap_err();
        assert!(matches!(err, ServerError::BindFailed { .. }));
    }
}
