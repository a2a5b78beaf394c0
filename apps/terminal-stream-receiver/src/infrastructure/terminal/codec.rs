//! Terminal Message Codec
//!
//! Classifies raw WebSocket payloads from the trading terminal. Decoding is
//! two-step: the envelope is read first to find the `type` discriminator,
//! then the payload is decoded again into the matching event.
//!
//! | `type`      | Result                           |
//! |-------------|----------------------------------|
//! | `"tick"`    | [`MessageKind::Tick`]            |
//! | `"trade"`   | [`MessageKind::Trade`]           |
//! | other/none  | [`MessageKind::Unknown`] (raw)   |

use serde::Deserialize;

use crate::domain::events::{MessageKind, TickEvent, TradeEvent};

/// Decode failures. Each one skips a single message; the session continues.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not a JSON object with a string `type`.
    #[error("malformed message envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// `type` was "tick" but the body did not decode.
    #[error("malformed tick payload: {0}")]
    Tick(#[source] serde_json::Error),

    /// `type` was "trade" but the body did not decode.
    #[error("malformed trade payload: {0}")]
    Trade(#[source] serde_json::Error),
}

impl DecodeError {
    /// Decoding stage that failed, for logs and metrics.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Envelope(_) => "envelope",
            Self::Tick(_) => "tick",
            Self::Trade(_) => "trade",
        }
    }
}

/// Minimal shape read before full decoding.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, rename = "type")]
    msg_type: Option<String>,
}

/// JSON codec for the terminal event stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalCodec;

impl TerminalCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classify one raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the envelope is malformed or a recognized
    /// type fails to decode. An unrecognized or missing `type` is not an
    /// error.
    pub fn classify(&self, raw: &[u8]) -> Result<MessageKind, DecodeError> {
        let envelope: Envelope = serde_json::from_slice(raw).map_err(DecodeError::Envelope)?;

        match envelope.msg_type.as_deref() {
            Some("tick") => self.decode_tick(raw).map(MessageKind::Tick),
            Some("trade") => self.decode_trade(raw).map(MessageKind::Trade),
            _ => Ok(MessageKind::Unknown(
                String::from_utf8_lossy(raw).into_owned(),
            )),
        }
    }

    /// Decode a tick body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Tick`] on malformed JSON or mistyped fields.
    pub fn decode_tick(&self, raw: &[u8]) -> Result<TickEvent, DecodeError> {
        serde_json::from_slice(raw).map_err(DecodeError::Tick)
    }

    /// Decode a trade body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Trade`] on malformed JSON or mistyped fields.
    pub fn decode_trade(&self, raw: &[u8]) -> Result<TradeEvent, DecodeError> {
        serde_json::from_slice(raw).map_err(DecodeError::Trade)
    }
}
