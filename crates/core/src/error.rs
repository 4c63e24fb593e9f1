//! Core error types for mcproxy

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    /// Client sent bytes that do not decode as the expected packet
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to dial {address}: {source}")]
    Dial {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access list error: {0}")]
    Access(String),

    /// The proxy failed to build an outgoing packet
    #[error("Encoding error: {0}")]
    Encode(String),
}

impl ProxyError {
    /// Shorthand for building a [`ProxyError::MalformedPacket`]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPacket(msg.into())
    }

    /// Whether the error was caused by the client's input rather than the environment
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedPacket(_))
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_helper() {
        let err = ProxyError::malformed("bad varint");
        assert!(err.is_malformed());
        assert_eq!(err.to_string(), "Malformed packet: bad varint");
    }

    #[test]
    fn test_dial_error_display() {
        let err = ProxyError::Dial {
            address: "127.0.0.1:25565".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(!err.is_malformed());
        assert_eq!(err.to_string(), "Failed to dial 127.0.0.1:25565: refused");
    }

    #[test]
    fn test_encode_error_is_not_client_fault() {
        let err = ProxyError::Encode("status response: key must be a string".into());
        assert!(!err.is_malformed());
        assert_eq!(err.to_string(), "Encoding error: status response: key must be a string");
    }
}
