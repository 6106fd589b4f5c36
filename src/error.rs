//! Error types for the mijia library.

use thiserror::Error;

/// The main error type for mijia operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (socket bind, send, config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration is structurally invalid.
    #[error("invalid config: {reason}")]
    Config { reason: String },

    /// Gateway password is not a 16-byte AES key.
    #[error("password for gateway {gateway_sid} must be 16 bytes, got {len}")]
    InvalidPassword { gateway_sid: String, len: usize },

    /// No password configured for the gateway that owns a device.
    #[error("no password for gateway {gateway_sid}")]
    MissingPassword { gateway_sid: String },

    /// Device has no known owning gateway.
    #[error("device {sid} has no known gateway")]
    UnknownGateway { sid: String },

    /// Gateway has been seen but its address is not known yet.
    #[error("no address known for gateway {sid}")]
    UnknownAddress { sid: String },

    /// No controllable channel is registered under the given accessory.
    #[error("no commander for accessory {key}")]
    UnknownAccessory { key: String },

    /// Malformed or unexpected protocol message.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// Bridge control channel was closed.
    #[error("channel closed")]
    ChannelClosed,
}

/// Result type alias for mijia operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingPassword {
            gateway_sid: "f0b429aa1463".into(),
        };
        assert_eq!(err.to_string(), "no password for gateway f0b429aa1463");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
