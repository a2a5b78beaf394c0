//! Receiver Configuration Settings
//!
//! Configuration types for the stream receiver, loaded from environment
//! variables. Everything the listener needs is carried in one explicitly
//! constructed [`ReceiverConfig`] value.

/// Which browser origins may open a connection.
///
/// Requests without an `Origin` header (native terminal clients) are always
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OriginPolicy {
    /// Accept every origin.
    #[default]
    AcceptAll,
    /// Accept only the listed origins (compared case-insensitively).
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Parse from a comma-separated list; `*` or an empty list accepts all.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(ToString::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::AcceptAll
        } else {
            Self::AllowList(origins)
        }
    }

    /// Check whether a handshake carrying `origin` may be upgraded.
    #[must_use]
    pub fn permits(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (Self::AcceptAll, _) | (Self::AllowList(_), None) => true,
            (Self::AllowList(allowed), Some(origin)) => {
                allowed.iter().any(|a| a.eq_ignore_ascii_case(origin))
            }
        }
    }
}

/// Listener and health port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Listen host.
    pub host: String,
    /// WebSocket listen port.
    pub port: u16,
    /// Health check HTTP port (0 = disabled).
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7681,
            health_port: 0,
        }
    }
}

/// Complete receiver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiverConfig {
    /// Listener settings.
    pub server: ServerSettings,
    /// Handshake origin policy.
    pub origins: OriginPolicy,
}

impl ReceiverConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is empty where one is required or does
    /// not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerSettings::default();

        let host = match lookup("RECEIVER_HOST") {
            Some(host) if host.trim().is_empty() => {
                return Err(ConfigError::EmptyValue("RECEIVER_HOST".to_string()));
            }
            Some(host) => host.trim().to_string(),
            None => defaults.host,
        };

        let server = ServerSettings {
            host,
            port: parse_u16(&lookup, "RECEIVER_PORT", defaults.port)?,
            health_port: parse_u16(&lookup, "RECEIVER_HEALTH_PORT", defaults.health_port)?,
        };

        let origins = lookup("RECEIVER_ALLOWED_ORIGINS")
            .map(|s| OriginPolicy::parse(&s))
            .unwrap_or_default();

        Ok(Self { server, origins })
    }

    /// Address string for binding the listener.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        if self.server.host.contains(':') {
            format!("[{}]:{}", self.server.host, self.server.port)
        } else {
            format!("{}:{}", self.server.host, self.server.port)
        }
    }

    /// WebSocket URL terminals should connect to.
    #[must_use]
    pub fn ws_endpoint(&self) -> String {
        format!("ws://{}", self.listen_addr())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable does not parse.
    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

fn parse_u16<F>(lookup: &F, key: &str, default: u16) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |v| {
        v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: v,
        })
    })
}
