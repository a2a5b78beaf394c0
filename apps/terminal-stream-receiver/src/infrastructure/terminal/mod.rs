//! Trading Terminal Protocol Adapters
//!
//! Classification and rendering of the terminal's JSON event stream:
//!
//! - **codec**: envelope read, per-type decoding into domain events
//! - **format**: console lines and session banners

pub mod codec;
pub mod format;

pub use codec::{DecodeError, TerminalCodec};
pub use format::{
    calendar_stamp, clock_stamp, connected_banner, disconnected_banner, format_message,
    format_tick, format_trade, startup_banner,
};
