//! Configuration Module
//!
//! Configuration loading for the receiver service.

mod settings;

pub use settings::{ConfigError, OriginPolicy, ReceiverConfig, ServerSettings};
