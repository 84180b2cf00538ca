//! Transport configuration.
//!
//! Both transports take a [`TransportConfig`]. Every field has a default, so
//! a JSON document only needs the fields it overrides:
//!
//! ```
//! use eventwire::config::TransportConfig;
//! use std::time::Duration;
//!
//! let config = TransportConfig::from_json(r#"{ "retry_delay": 250 }"#).unwrap();
//!
//! assert_eq!(config.retry_delay, Duration::from_millis(250));
//! assert_eq!(config.address.port(), 56351);
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::DEFAULT_MAX_PAYLOAD_SIZE;
use crate::writer::WriterConfig;

/// Default loopback port.
pub const DEFAULT_PORT: u16 = 56351;

/// Delay between connect attempts while the peer refuses connections.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Endpoint to bind (accepting side) or dial (connecting side).
    pub address: SocketAddr,
    /// Written as integer milliseconds.
    #[serde(with = "duration_ms")]
    pub retry_delay: Duration,
    /// Largest frame body the receive loop will allocate.
    pub max_payload_size: usize,
    pub writer: WriterConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            retry_delay: DEFAULT_RETRY_DELAY,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            writer: WriterConfig::default(),
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON config document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Keep the host, change the port. Port 0 lets the OS pick.
    pub fn with_port(mut self, port: u16) -> Self {
        self.address.set_port(port);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.writer.channel_capacity = capacity;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();

        assert_eq!(config.address, "127.0.0.1:56351".parse().unwrap());
        assert_eq!(config.retry_delay, Duration::from_millis(100));
        assert_eq!(config.max_payload_size, DEFAULT_MAX_PAYLOAD_SIZE);
        assert_eq!(config.writer, WriterConfig::default());
    }

    #[test]
    fn test_builder_configuration() {
        let config = TransportConfig::new()
            .with_port(0)
            .with_retry_delay(Duration::from_millis(5))
            .with_max_payload_size(1024)
            .with_channel_capacity(8);

        assert_eq!(config.address.port(), 0);
        assert!(config.address.ip().is_loopback());
        assert_eq!(config.retry_delay, Duration::from_millis(5));
        assert_eq!(config.max_payload_size, 1024);
        assert_eq!(config.writer.channel_capacity, 8);
    }

    #[test]
    fn test_json_partial_override() {
        let config = TransportConfig::from_json(
            r#"{ "address": "127.0.0.1:9000", "writer": { "channel_capacity": 4 } }"#,
        )
        .unwrap();

        assert_eq!(config.address.port(), 9000);
        assert_eq!(config.writer.channel_capacity, 4);
        assert_eq!(config.retry_delay, DEFAULT_RETRY_DELAY);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = TransportConfig::new().with_retry_delay(Duration::from_millis(42));
        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains(r#""retry_delay":42"#));
        assert_eq!(TransportConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_invalid() {
        let result = TransportConfig::from_json(r#"{ "retry_delay": "soon" }"#);
        assert!(matches!(result, Err(RelayError::Json(_))));
    }
}
