//! # Network Configuration
//!
//! Connection options for the EO client networking layer.
//!
//! # Example
//!
//! ```rust
//! use eoclient_network::NetworkConfig;
//! use std::time::Duration;
//!
//! let config = NetworkConfig {
//!     host: "game.endless-online.com".to_string(),
//!     port: 8078,
//!     connect_timeout: Duration::from_secs(5),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use eoclient_core::{ClientVersion, EoError, Result};
use std::time::Duration;

/// Client connection options
///
/// # Purpose
/// Defines where and how the client connects, and what it tells the server
/// about itself during the init handshake.
///
/// # Fields
///
/// - `host`: Server host name or IP address
/// - `port`: Server TCP port
/// - `connect_timeout`: How long to wait for the TCP connection and the init reply
/// - `version`: Client version sent in the init request
/// - `hdid`: Hardware id string sent in the init request
/// - `keepalive`: TCP keep-alive idle time, `None` to leave the OS default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Server host name or IP address
    ///
    /// # Default
    /// `"127.0.0.1"`
    pub host: String,

    /// Server TCP port
    ///
    /// # Default
    /// 8078 (standard EO server port)
    pub port: u16,

    /// Timeout for the TCP connect and for the handshake reply
    ///
    /// # Default
    /// 10 seconds
    ///
    /// # Notes
    /// - Applies separately to the connect and to the init reply
    /// - A refused or timed out connect leaves the client `Disconnected`
    pub connect_timeout: Duration,

    /// Client version reported in the init request
    ///
    /// # Default
    /// 0.0.28
    ///
    /// # Notes
    /// Servers reject older versions with an `OutOfDate` reply.
    pub version: ClientVersion,

    /// Hardware id reported in the init request
    ///
    /// # Default
    /// `"111111111"`
    pub hdid: String,

    /// TCP keep-alive idle time
    ///
    /// # Default
    /// 30 seconds
    pub keepalive: Option<Duration>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8078,
            connect_timeout: Duration::from_secs(10),
            version: ClientVersion::default(),
            hdid: "111111111".to_string(),
            keepalive: Some(Duration::from_secs(30)),
        }
    }
}

impl NetworkConfig {
    /// `host:port` as passed to the resolver
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// - `Ok(())` if configuration is valid
    /// - `Err(...)` with description if invalid
    ///
    /// # Validation Rules
    /// - `host` must not be empty
    /// - `port` must be non-zero
    /// - `connect_timeout` must be non-zero
    /// - `hdid` must fit in a length-prefixed string
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(EoError::Config("host must not be empty".into()));
        }

        if self.port == 0 {
            return Err(EoError::Config("port must be greater than 0".into()));
        }

        if self.connect_timeout.is_zero() {
            return Err(EoError::Config("connect_timeout must be greater than 0".into()));
        }

        if self.hdid.len() > 252 {
            return Err(EoError::Config(format!(
                "hdid is too long ({} bytes, max 252)",
                self.hdid.len()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.port, 8078);
        assert_eq!(config.address(), "127.0.0.1:8078");
        assert_eq!(config.version, ClientVersion::new(0, 0, 28));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = NetworkConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NetworkConfig {
            host: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NetworkConfig {
            connect_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NetworkConfig {
            hdid: "x".repeat(300),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EoError::Config(_))));
    }
}
