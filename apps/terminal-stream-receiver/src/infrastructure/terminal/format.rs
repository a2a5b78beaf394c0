//! Console Line Formatting
//!
//! Pure rendering of classified messages and session banners. Nothing here
//! performs I/O; callers hand the returned lines to a
//! [`LineSink`](crate::application::ports::LineSink).
//!
//! Prices render with 5 decimals, money and lots with 2, regardless of
//! magnitude.

use chrono::{DateTime, TimeZone};

use crate::domain::events::{Direction, MessageKind, TickEvent, TradeAction, TradeEvent};
use crate::domain::session::SessionCounters;

/// Horizontal rule under the connection banner.
const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Render the per-message clock stamp (`HH:MM:SS.mmm`).
#[must_use]
pub fn clock_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M:%S%.3f").to_string()
}

/// Render a calendar stamp (`YYYY-MM-DD HH:MM:SS`) for banners.
#[must_use]
pub fn calendar_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render one classified message.
///
/// Returns `None` for trade events whose action is neither open nor close;
/// those are counted but produce no output.
#[must_use]
pub fn format_message(kind: &MessageKind, stamp: &str) -> Option<String> {
    match kind {
        MessageKind::Tick(tick) => Some(format_tick(tick, stamp)),
        MessageKind::Trade(trade) => format_trade(trade, stamp),
        MessageKind::Unknown(raw) => Some(format!("[{stamp}] 📩 {raw}")),
    }
}

/// Render a tick line.
#[must_use]
pub fn format_tick(tick: &TickEvent, stamp: &str) -> String {
    format!(
        "[{stamp}] 📊 TICK | {} | Bid: {:.5} | Ask: {:.5} | Spread: {}",
        tick.symbol, tick.bid, tick.ask, tick.spread
    )
}

/// Render a trade line, or `None` for an unrecognized action.
#[must_use]
pub fn format_trade(trade: &TradeEvent, stamp: &str) -> Option<String> {
    match trade.action {
        Some(TradeAction::Open) => Some(format_trade_open(trade, stamp)),
        Some(TradeAction::Close) => Some(format_trade_close(trade, stamp)),
        Some(TradeAction::Other(_)) | None => None,
    }
}

fn format_trade_open(trade: &TradeEvent, stamp: &str) -> String {
    let marker = if trade.direction == Some(Direction::Sell) {
        "🔴"
    } else {
        "🟢"
    };
    let direction = trade
        .direction
        .as_ref()
        .map(Direction::label)
        .unwrap_or_default();

    let mut line = format!(
        "[{stamp}] {marker} TRADE OPEN | Ticket: #{} | {direction} {} | {:.2} lots @ {:.5}",
        trade.ticket, trade.symbol, trade.volume, trade.entry_price
    );
    if trade.has_protective_levels() {
        line.push_str(&format!(" | SL: {:.5} | TP: {:.5}", trade.sl, trade.tp));
    }
    line
}

fn format_trade_close(trade: &TradeEvent, stamp: &str) -> String {
    let (marker, label) = if trade.is_loss() {
        ("❌", "LOSS")
    } else {
        ("✅", "PROFIT")
    };

    let mut line = format!(
        "[{stamp}] {marker} TRADE CLOSE | Ticket: #{} | {} | {:.2} lots @ {:.5} | {label}: ${:.2}",
        trade.ticket, trade.symbol, trade.volume, trade.close_price, trade.total_profit
    );
    if trade.has_cost_breakdown() {
        line.push_str(&format!(
            " (P: ${:.2}, S: ${:.2}, C: ${:.2})",
            trade.profit, trade.swap, trade.commission
        ));
    }
    line
}

// =============================================================================
// Banners
// =============================================================================

/// Lines printed once when the receiver starts listening.
#[must_use]
pub fn startup_banner(endpoint: &str, started: &str) -> Vec<String> {
    vec![
        "╔═══════════════════════════════════════════════════════════╗".to_string(),
        "║   Terminal Stream Receiver - Tick & Trade Event Streaming ║".to_string(),
        "╚═══════════════════════════════════════════════════════════╝".to_string(),
        format!("Endpoint: {endpoint}"),
        format!("Started: {started}"),
        String::new(),
        "⏳ Waiting for terminal connection...".to_string(),
        "Press Ctrl+C to stop".to_string(),
        String::new(),
    ]
}

/// Lines printed when a session enters the active state.
#[must_use]
pub fn connected_banner(connected_at: &str) -> Vec<String> {
    vec![
        String::new(),
        format!("✅ Terminal connected → {connected_at}"),
        RULE.to_string(),
        "Listening for tick data and trade events...".to_string(),
        String::new(),
    ]
}

/// Lines printed when a session closes.
#[must_use]
pub fn disconnected_banner(counters: &SessionCounters) -> Vec<String> {
    vec![
        String::new(),
        "❌ Terminal disconnected".to_string(),
        format!(
            "Session stats: {} ticks, {} trades",
            counters.tick_count, counters.trade_count
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use proptest::prelude::*;

    const STAMP: &str = "10:15:30.250";

    fn open(direction: &str, sl: f64, tp: f64) -> TradeEvent {
        TradeEvent {
            action: Some(TradeAction::Open),
            ticket: 123_456,
            symbol: "EURUSD".to_string(),
            direction: Some(Direction::from(direction.to_string())),
            volume: 0.1,
            entry_price: 1.0852,
            sl,
            tp,
            ..TradeEvent::default()
        }
    }

    fn close(total_profit: f64, swap: f64, commission: f64) -> TradeEvent {
        TradeEvent {
            action: Some(TradeAction::Close),
            ticket: 123_456,
            symbol: "EURUSD".to_string(),
            volume: 0.1,
            close_price: 1.0872,
            profit: 20.0,
            swap,
            commission,
            total_profit,
            ..TradeEvent::default()
        }
    }

    #[test]
    fn tick_line() {
        let tick = TickEvent {
            symbol: "EURUSD".to_string(),
            bid: 1.105,
            ask: 1.1052,
            spread: 2,
            ..TickEvent::default()
        };
        assert_eq!(
            format_tick(&tick, STAMP),
            "[10:15:30.250] 📊 TICK | EURUSD | Bid: 1.10500 | Ask: 1.10520 | Spread: 2"
        );
    }

    #[test]
    fn open_line_without_levels() {
        let line = format_trade(&open("buy", 0.0, 0.0), STAMP).unwrap();
        assert_eq!(
            line,
            "[10:15:30.250] 🟢 TRADE OPEN | Ticket: #123456 | BUY EURUSD | 0.10 lots @ 1.08520"
        );
        assert!(!line.contains("SL:"));
    }

    #[test]
    fn open_line_with_stop_loss_only() {
        let line = format_trade(&open("buy", 1.1, 0.0), STAMP).unwrap();
        assert!(line.ends_with(" | SL: 1.10000 | TP: 0.00000"));
    }

    #[test]
    fn open_sell_uses_red_marker() {
        let sell = format_trade(&open("sell", 0.0, 0.0), STAMP).unwrap();
        let buy = format_trade(&open("buy", 0.0, 0.0), STAMP).unwrap();
        assert!(sell.contains("🔴"));
        assert!(sell.contains("SELL EURUSD"));
        assert!(buy.contains("🟢"));
        assert!(!buy.contains("🔴"));
    }

    #[test]
    fn open_without_direction_renders_empty_label() {
        let mut trade = open("buy", 0.0, 0.0);
        trade.direction = None;
        let line = format_trade(&trade, STAMP).unwrap();
        assert!(line.contains("🟢"));
        assert!(line.contains("|  EURUSD |"));
    }

    #[test]
    fn close_line_profit_with_breakdown() {
        let line = format_trade(&close(18.95, -0.35, -0.7), STAMP).unwrap();
        assert_eq!(
            line,
            "[10:15:30.250] ✅ TRADE CLOSE | Ticket: #123456 | EURUSD | 0.10 lots @ 1.08720 | PROFIT: $18.95 (P: $20.00, S: $-0.35, C: $-0.70)"
        );
    }

    #[test]
    fn close_line_loss_without_breakdown() {
        let line = format_trade(&close(-12.5, 0.0, 0.0), STAMP).unwrap();
        assert_eq!(
            line,
            "[10:15:30.250] ❌ TRADE CLOSE | Ticket: #123456 | EURUSD | 0.10 lots @ 1.08720 | LOSS: $-12.50"
        );
    }

    #[test]
    fn close_at_zero_is_profit() {
        let line = format_trade(&close(0.0, 0.0, 0.0), STAMP).unwrap();
        assert!(line.contains("✅"));
        assert!(line.contains("PROFIT: $0.00"));
    }

    #[test]
    fn unrecognized_action_produces_no_line() {
        let mut trade = open("buy", 0.0, 0.0);
        trade.action = Some(TradeAction::Other("modify".to_string()));
        assert_eq!(format_trade(&trade, STAMP), None);

        trade.action = None;
        assert_eq!(format_message(&MessageKind::Trade(trade), STAMP), None);
    }

    #[test]
    fn unknown_line_is_raw_payload() {
        let kind = MessageKind::Unknown(r#"{"type":"heartbeat"}"#.to_string());
        assert_eq!(
            format_message(&kind, STAMP).unwrap(),
            r#"[10:15:30.250] 📩 {"type":"heartbeat"}"#
        );
    }

    #[test]
    fn stamps_render_fixed_width() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let at = offset.with_ymd_and_hms(2024, 1, 15, 9, 5, 7).unwrap();
        assert_eq!(clock_stamp(&at), "09:05:07.000");
        assert_eq!(calendar_stamp(&at), "2024-01-15 09:05:07");
        assert_eq!(clock_stamp(&Utc::now()).len(), 12);
    }

    #[test]
    fn banners_carry_counters_and_endpoint() {
        let counters = SessionCounters {
            tick_count: 3,
            trade_count: 1,
        };
        let lines = disconnected_banner(&counters);
        assert_eq!(lines.last().unwrap(), "Session stats: 3 ticks, 1 trades");

        let lines = startup_banner("ws://127.0.0.1:7681", "2024-01-15 09:05:07");
        assert!(lines.contains(&"Endpoint: ws://127.0.0.1:7681".to_string()));

        let lines = connected_banner("2024-01-15 09:05:07");
        assert!(lines.iter().any(|l| l.ends_with("2024-01-15 09:05:07")));
    }

    proptest! {
        #[test]
        fn close_label_follows_sign(total in -1_000_000f64..1_000_000.0) {
            let line = format_trade(&close(total, 0.0, 0.0), STAMP).unwrap();
            if total >= 0.0 {
                prop_assert!(line.contains("PROFIT:"));
                prop_assert!(!line.contains("LOSS:"));
            } else {
                prop_assert!(line.contains("LOSS:"));
                prop_assert!(!line.contains("PROFIT:"));
            }
        }

        #[test]
        fn tick_prices_have_five_decimals(bid in 0f64..100_000.0, ask in 0f64..100_000.0) {
            let tick = TickEvent { symbol: "XAUUSD".to_string(), bid, ask, ..TickEvent::default() };
            let line = format_tick(&tick, STAMP);
            let expected_bid = format!("Bid: {bid:.5} |");
            let expected_ask = format!("Ask: {ask:.5} |");
            prop_assert!(line.contains(&expected_bid));
            prop_assert!(line.contains(&expected_ask));
            for field in [&expected_bid, &expected_ask] {
                let digits = field.split('.').nth(1).unwrap().trim_end_matches(" |");
                prop_assert_eq!(digits.len(), 5);
            }
        }

        #[test]
        fn formatting_is_idempotent(ticket in any::<i64>(), volume in 0f64..100.0, price in 0f64..10_000.0) {
            let trade = TradeEvent { ticket, volume, entry_price: price, ..open("sell", 0.0, 0.0) };
            let kind = MessageKind::Trade(trade);
            prop_assert_eq!(format_message(&kind, STAMP), format_message(&kind, STAMP));
        }
    }
}
