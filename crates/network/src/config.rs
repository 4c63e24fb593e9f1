//! # Network Configuration
//!
//! Runtime options for the listener and the connection gate.
//!
//! # Example
//!
//! ```rust
//! use mcproxy_network::NetworkConfig;
//! use std::time::Duration;
//!
//! let config = NetworkConfig {
//!     handshake_timeout: Duration::from_secs(5),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use mcproxy_config::ProxyConfig;
use std::time::Duration;

/// Network configuration options
///
/// # Fields
///
/// - `handshake_timeout`: How long a client may take to get through the gate
/// - `dial_timeout`: Backend connect timeout
/// - `linger`: SO_LINGER applied to kicked clients
/// - `nodelay`: Whether TCP_NODELAY is set on accepted and dialed sockets
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Deadline for the whole handshake/login exchange
    ///
    /// # Default
    /// 10 seconds
    ///
    /// # Notes
    /// - Enforced by the listener around the gate, not inside it
    /// - When it expires the client socket is dropped, which aborts any
    ///   pending read or write
    pub handshake_timeout: Duration,

    /// Backend connect timeout
    ///
    /// # Default
    /// 5 seconds
    pub dial_timeout: Duration,

    /// Linger applied before closing a kicked client
    ///
    /// # Purpose
    /// Gives the disconnect packet time to reach the client before the OS
    /// tears the connection down.
    ///
    /// # Default
    /// 10 seconds. `Duration::ZERO` leaves the socket's linger setting alone.
    pub linger: Duration,

    /// Disable Nagle's algorithm on both legs
    ///
    /// # Default
    /// `true`
    pub nodelay: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            dial_timeout: Duration::from_secs(5),
            linger: Duration::from_secs(10),
            nodelay: true,
        }
    }
}

impl From<&ProxyConfig> for NetworkConfig {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            handshake_timeout: config.handshake_timeout(),
            dial_timeout: config.dial_timeout(),
            linger: config.linger(),
            ..Default::default()
        }
    }
}

impl NetworkConfig {
    /// Validate the configuration
    ///
    /// # Checks
    /// - `handshake_timeout` must be > 0
    /// - `dial_timeout` must be > 0 and should be < `handshake_timeout`
    pub fn validate(&self) -> Result<(), String> {
        if self.handshake_timeout.is_zero() {
            return Err("handshake_timeout must be > 0".to_string());
        }

        if self.dial_timeout.is_zero() {
            return Err("dial_timeout must be > 0".to_string());
        }

        if self.dial_timeout >= self.handshake_timeout {
            tracing::warn!("dial_timeout >= handshake_timeout, slow backends will hit the handshake deadline first");
        }

        Ok(())
    }

    /// Linger to apply to kicked clients, `None` when disabled
    pub fn kick_linger(&self) -> Option<Duration> {
        (!self.linger.is_zero()).then_some(self.linger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.linger, Duration::from_secs(10));
        assert_eq!(config.kick_linger(), Some(Duration::from_secs(10)));
        assert!(config.nodelay);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_timeouts() {
        let mut config = NetworkConfig::default();
        config.handshake_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.dial_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_linger_disabled() {
        let config = NetworkConfig {
            linger: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(config.kick_linger(), None);
    }

    #[test]
    fn test_from_proxy_config() {
        let mut proxy = ProxyConfig::default();
        proxy.handshake_timeout_secs = 3;
        proxy.linger_secs = 0;

        let config = NetworkConfig::from(&proxy);
        assert_eq!(config.handshake_timeout, Duration::from_secs(3));
        assert_eq!(config.kick_linger(), None);
    }
}
