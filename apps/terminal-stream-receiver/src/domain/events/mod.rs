//! Terminal Event Types
//!
//! Decoded market-tick and trade-lifecycle events as the trading terminal
//! sends them. Field names follow the wire format; absent numeric fields
//! decode as zero and absent strings as empty. An explicit `null` is treated
//! the same as an absent field.
//!
//! # Wire Format (JSON)
//!
//! ```json
//! {"type":"tick","symbol":"EURUSD","bid":1.10500,"ask":1.10520,"time":"2024.01.15 10:00:00","spread":2,"volume":0}
//! {"type":"trade","action":"open","ticket":1001,"symbol":"EURUSD","direction":"buy","volume":0.10,"entry_price":1.10520,"sl":1.10000,"tp":1.11000}
//! {"type":"trade","action":"close","ticket":1001,"symbol":"EURUSD","volume":0.10,"close_price":1.10720,"profit":20.0,"swap":-0.35,"commission":-0.70,"total_profit":18.95}
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Decode a field, mapping JSON `null` to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// =============================================================================
// Tick
// =============================================================================

/// A single market quote snapshot.
///
/// `ask >= bid` is expected but never enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickEvent {
    /// Instrument symbol (e.g. "EURUSD").
    #[serde(deserialize_with = "null_as_default")]
    pub symbol: String,
    /// Best bid price.
    #[serde(deserialize_with = "null_as_default")]
    pub bid: f64,
    /// Best ask price.
    #[serde(deserialize_with = "null_as_default")]
    pub ask: f64,
    /// Terminal-side quote time, passed through verbatim.
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    /// Spread in points.
    #[serde(deserialize_with = "null_as_default")]
    pub spread: i32,
    /// Tick volume.
    #[serde(deserialize_with = "null_as_default")]
    pub volume: i64,
}

// =============================================================================
// Trade
// =============================================================================

/// Lifecycle action carried by a trade event.
///
/// Any string is accepted on the wire; values other than `open` and `close`
/// land in [`TradeAction::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TradeAction {
    /// Position opened.
    Open,
    /// Position closed.
    Close,
    /// Unrecognized action, kept verbatim.
    Other(String),
}

impl From<String> for TradeAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "open" => Self::Open,
            "close" => Self::Close,
            _ => Self::Other(value),
        }
    }
}

impl From<TradeAction> for String {
    fn from(action: TradeAction) -> Self {
        match action {
            TradeAction::Open => "open".to_string(),
            TradeAction::Close => "close".to_string(),
            TradeAction::Other(other) => other,
        }
    }
}

/// Position direction, only meaningful on `open` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    /// Long position.
    Buy,
    /// Short position.
    Sell,
    /// Unrecognized direction, kept verbatim.
    Other(String),
}

impl Direction {
    /// Upper-case label used in formatted output.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Buy => "BUY".to_string(),
            Self::Sell => "SELL".to_string(),
            Self::Other(other) => other.to_uppercase(),
        }
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "buy" => Self::Buy,
            "sell" => Self::Sell,
            _ => Self::Other(value),
        }
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Buy => "buy".to_string(),
            Direction::Sell => "sell".to_string(),
            Direction::Other(other) => other,
        }
    }
}

/// A position open or close notification.
///
/// `ticket` identifies the position across its open/close pair. The pair is
/// never correlated here; each event stands alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeEvent {
    /// Lifecycle action (`None` when the field is absent).
    pub action: Option<TradeAction>,
    /// Position ticket number.
    #[serde(deserialize_with = "null_as_default")]
    pub ticket: i64,
    /// Instrument symbol.
    #[serde(deserialize_with = "null_as_default")]
    pub symbol: String,
    /// Position direction (open events only).
    pub direction: Option<Direction>,
    /// Volume in lots.
    #[serde(deserialize_with = "null_as_default")]
    pub volume: f64,
    /// Entry price (open events).
    #[serde(deserialize_with = "null_as_default")]
    pub entry_price: f64,
    /// Close price (close events).
    #[serde(deserialize_with = "null_as_default")]
    pub close_price: f64,
    /// Gross profit.
    #[serde(deserialize_with = "null_as_default")]
    pub profit: f64,
    /// Accumulated swap.
    #[serde(deserialize_with = "null_as_default")]
    pub swap: f64,
    /// Commission charged.
    #[serde(deserialize_with = "null_as_default")]
    pub commission: f64,
    /// Net result: profit + swap + commission.
    #[serde(deserialize_with = "null_as_default")]
    pub total_profit: f64,
    /// Stop-loss level (zero when unset).
    #[serde(deserialize_with = "null_as_default")]
    pub sl: f64,
    /// Take-profit level (zero when unset).
    #[serde(deserialize_with = "null_as_default")]
    pub tp: f64,
    /// Terminal-side open time.
    #[serde(deserialize_with = "null_as_default")]
    pub open_time: String,
    /// Terminal-side close time.
    #[serde(deserialize_with = "null_as_default")]
    pub close_time: String,
}

impl TradeEvent {
    /// Whether a stop-loss or take-profit level is attached.
    #[must_use]
    pub fn has_protective_levels(&self) -> bool {
        self.sl != 0.0 || self.tp != 0.0
    }

    /// Whether swap or commission contributed to the result.
    #[must_use]
    pub fn has_cost_breakdown(&self) -> bool {
        self.swap != 0.0 || self.commission != 0.0
    }

    /// Whether the closed position lost money. Zero counts as profit.
    #[must_use]
    pub fn is_loss(&self) -> bool {
        self.total_profit < 0.0
    }
}

// =============================================================================
// Classified Message
// =============================================================================

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    /// Market quote.
    Tick(TickEvent),
    /// Trade lifecycle event.
    Trade(TradeEvent),
    /// Unrecognized or missing `type`; the raw payload is kept for display.
    Unknown(String),
}

impl MessageKind {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tick(_) => "tick",
            Self::Trade(_) => "trade",
            Self::Unknown(_) => "unknown",
        }
    }
}
