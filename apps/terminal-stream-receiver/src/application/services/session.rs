//! Connection Session
//!
//! Drives one upgraded connection from accept to close. Messages are handled
//! strictly in order: each payload is classified, counted, rendered and
//! written before the next read is issued.
//!
//! # States
//!
//! ```text
//!            message ok / decode error / close frame
//!              ┌──────────┐
//!              ▼          │
//! accept ──► ACTIVE ──────┘
//!              │
//!              │ read error / end of stream
//!              ▼
//!            CLOSED ──► summary
//! ```
//!
//! A close frame does not end the loop by itself: the transport sends its
//! close reply on the following read, which then reports end of stream.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::ports::LineSink;
use crate::domain::events::{MessageKind, TradeEvent};
use crate::domain::session::{SessionCounters, SessionId, SessionState, SessionSummary};
use crate::infrastructure::metrics;
use crate::infrastructure::terminal::{
    DecodeError, TerminalCodec, calendar_stamp, clock_stamp, connected_banner,
    disconnected_banner, format_message,
};

/// One terminal connection's read loop and counters.
pub struct Session {
    id: SessionId,
    codec: TerminalCodec,
    sink: Arc<dyn LineSink>,
    counters: SessionCounters,
    state: SessionState,
    opened_at: Instant,
}

impl Session {
    /// Create a session in the `Active` state.
    #[must_use]
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self {
            id: Uuid::new_v4(),
            codec: TerminalCodec::new(),
            sink,
            counters: SessionCounters::new(),
            state: SessionState::Active,
            opened_at: Instant::now(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Current counters.
    #[must_use]
    pub const fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Read from `stream` until it fails or ends, then report.
    ///
    /// The stream is owned by this call and dropped before the summary is
    /// returned, which releases the underlying connection on every path.
    pub async fn run<S, E>(self, stream: S) -> SessionSummary
    where
        S: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let span = tracing::info_span!("session", session_id = %self.id);
        self.read_loop(stream).instrument(span).await
    }

    async fn read_loop<S, E>(mut self, mut stream: S) -> SessionSummary
    where
        S: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        metrics::record_session_opened();
        self.sink
            .emit_all(&connected_banner(&calendar_stamp(&Local::now())));
        tracing::info!("Session active");

        while !self.state.is_closed() {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => self.process(text.as_bytes()),
                Some(Ok(Message::Binary(data))) => self.process(&data),
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(frame = ?frame, "Peer sent close frame");
                }
                Some(Ok(_)) => {
                    // Control frames are answered by the transport
                }
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "Read failed");
                    self.state = SessionState::Closed;
                }
                None => {
                    tracing::debug!("Stream ended");
                    self.state = SessionState::Closed;
                }
            }
        }

        drop(stream);
        self.finish()
    }

    /// Read-loop step: a decode failure is logged and the message skipped.
    fn process(&mut self, raw: &[u8]) {
        if let Err(e) = self.handle_payload(raw) {
            tracing::warn!(stage = e.stage(), error = %e, "Error parsing message");
            metrics::record_decode_error(e.stage());
        }
    }

    /// Classify, count and render one raw payload.
    ///
    /// A decode failure leaves the counters untouched and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is malformed.
    pub fn handle_payload(&mut self, raw: &[u8]) -> Result<MessageKind, DecodeError> {
        let started = Instant::now();

        let kind = self.codec.classify(raw)?;

        self.counters.record(&kind);
        metrics::record_message(&kind);

        let stamp = clock_stamp(&Local::now());
        match format_message(&kind, &stamp) {
            Some(line) => self.sink.emit(&line),
            None => {
                if let MessageKind::Trade(trade) = &kind {
                    log_unrendered_trade(trade);
                }
            }
        }

        metrics::record_processing_duration(started.elapsed());
        Ok(kind)
    }

    fn finish(self) -> SessionSummary {
        let summary = SessionSummary {
            session_id: self.id,
            counters: self.counters,
            duration: self.opened_at.elapsed(),
        };

        self.sink.emit_all(&disconnected_banner(&summary.counters));
        metrics::record_session_closed();
        tracing::info!(
            state = self.state.as_str(),
            ticks = summary.counters.tick_count,
            trades = summary.counters.trade_count,
            duration_ms = summary.duration.as_millis(),
            "Session closed"
        );

        summary
    }
}

fn log_unrendered_trade(trade: &TradeEvent) {
    tracing::debug!(
        ticket = trade.ticket,
        action = ?trade.action,
        "Trade event with unrecognized action not rendered"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::output::BufferSink;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn text(json: &str) -> Result<Message, WsError> {
        Ok(Message::text(json.to_string()))
    }

    fn session() -> (Session, BufferSink) {
        let sink = BufferSink::new();
        (Session::new(Arc::new(sink.clone())), sink)
    }

    fn message_lines(sink: &BufferSink) -> Vec<String> {
        sink.lines()
            .into_iter()
            .filter(|l| l.starts_with('['))
            .collect()
    }

    #[tokio::test]
    async fn tick_then_transport_error() {
        let (session, sink) = session();
        let frames = stream::iter(vec![
            text(r#"{"type":"tick","symbol":"EURUSD","bid":1.10500,"ask":1.10520,"spread":2}"#),
            Err(WsError::ConnectionClosed),
        ]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters.tick_count, 1);
        assert_eq!(summary.counters.trade_count, 0);

        let lines = message_lines(&sink);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("TICK | EURUSD | Bid: 1.10500 | Ask: 1.10520 | Spread: 2"));
        assert_eq!(
            sink.lines().last().unwrap(),
            "Session stats: 1 ticks, 0 trades"
        );
    }

    #[tokio::test]
    async fn malformed_message_does_not_close_session() {
        let (session, sink) = session();
        let frames = stream::iter(vec![
            text("{not json"),
            text(r#"{"type":"tick","symbol":"USDJPY","bid":"oops"}"#),
            text(r#"{"type":"tick","symbol":"USDJPY","bid":148.1,"ask":148.12,"spread":2}"#),
        ]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters.tick_count, 1);
        assert_eq!(message_lines(&sink).len(), 1);
    }

    #[tokio::test]
    async fn heartbeat_uses_fallback_line_only() {
        let (session, sink) = session();
        let frames = stream::iter(vec![text(r#"{"type":"heartbeat"}"#)]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters, SessionCounters::default());
        let lines = message_lines(&sink);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(r#"📩 {"type":"heartbeat"}"#));
    }

    #[tokio::test]
    async fn trade_open_levels_suffix() {
        let (session, sink) = session();
        let frames = stream::iter(vec![
            text(r#"{"type":"trade","action":"open","ticket":1,"symbol":"EURUSD","direction":"buy","volume":0.1,"entry_price":1.1,"sl":0,"tp":0}"#),
            text(r#"{"type":"trade","action":"open","ticket":2,"symbol":"EURUSD","direction":"buy","volume":0.1,"entry_price":1.1,"sl":1.1,"tp":0}"#),
        ]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters.trade_count, 2);
        let lines = message_lines(&sink);
        assert!(!lines[0].contains("SL:"));
        assert!(lines[1].contains(" | SL: 1.10000 | TP: 0.00000"));
    }

    #[tokio::test]
    async fn unrecognized_trade_action_is_counted_but_not_rendered() {
        let (session, sink) = session();
        let frames = stream::iter(vec![text(
            r#"{"type":"trade","action":"modify","ticket":9,"symbol":"EURUSD"}"#,
        )]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters.trade_count, 1);
        assert!(message_lines(&sink).is_empty());
    }

    #[tokio::test]
    async fn binary_and_control_frames() {
        let (session, sink) = session();
        let frames = stream::iter(vec![
            Ok::<Message, WsError>(Message::Ping(vec![1, 2].into())),
            Ok(Message::binary(
                br#"{"type":"tick","symbol":"GBPUSD","bid":1.27,"ask":1.2702}"#.to_vec(),
            )),
        ]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters.tick_count, 1);
        let lines = message_lines(&sink);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("GBPUSD"));
    }

    #[tokio::test]
    async fn close_frame_waits_for_transport_to_finish() {
        let (session, sink) = session();
        let frames = stream::iter(vec![
            text(r#"{"type":"tick","symbol":"EURUSD","bid":1.1,"ask":1.1002}"#),
            Ok(Message::Close(None)),
            Err(WsError::ConnectionClosed),
        ]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters.tick_count, 1);
        assert_eq!(
            sink.lines().last().unwrap(),
            "Session stats: 1 ticks, 0 trades"
        );
    }

    #[tokio::test]
    async fn null_fields_are_counted() {
        let (session, sink) = session();
        let frames = stream::iter(vec![
            text(r#"{"type":"tick","symbol":null,"bid":1.1,"ask":1.2,"spread":null}"#),
            text(r#"{"type":"trade","action":"close","ticket":4,"swap":null,"total_profit":2}"#),
        ]);

        let summary = session.run(frames).await;

        assert_eq!(summary.counters.tick_count, 1);
        assert_eq!(summary.counters.trade_count, 1);
        assert_eq!(message_lines(&sink).len(), 2);
    }

    #[tokio::test]
    async fn banners_wrap_the_session() {
        let (session, sink) = session();
        let summary = session.run(stream::iter(Vec::<Result<Message, WsError>>::new())).await;

        let lines = sink.lines();
        assert!(lines.iter().any(|l| l.starts_with("✅ Terminal connected → ")));
        assert!(lines.contains(&"❌ Terminal disconnected".to_string()));
        assert_eq!(lines.last().unwrap(), "Session stats: 0 ticks, 0 trades");
        assert_eq!(summary.counters, SessionCounters::default());
    }

    #[test]
    fn handle_payload_leaves_counters_on_error() {
        let (mut session, sink) = session();

        assert!(session.handle_payload(b"[]garbage").is_err());
        assert_eq!(session.counters(), SessionCounters::default());
        assert!(sink.is_empty());
        assert_eq!(session.state(), SessionState::Active);

        let kind = session
            .handle_payload(br#"{"type":"trade","action":"close","ticket":5,"total_profit":0}"#)
            .unwrap();
        assert_eq!(kind.as_str(), "trade");
        assert_eq!(session.counters().trade_count, 1);
        assert!(sink.lines()[0].contains("PROFIT: $0.00"));
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let (a, _) = session();
        let (b, _) = session();
        assert_ne!(a.id(), b.id());
    }
}
