//! Error types for the RFB client.

use rfb_protocol::HandshakeError;
use std::io;
use thiserror::Error;

/// Errors that can occur during VNC client operation.
#[derive(Debug, Error)]
pub enum RfbClientError {
    /// Address or port text is not a dotted-quad IPv4 address and a port in 1..=65535.
    #[error("Invalid IP address or port: {0}")]
    AddressFormat(String),

    /// Connection failed (TCP connection establishment failed).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection timeout.
    #[error("Connection timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Transport-level error during an active phase (short read, reset, etc.).
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Protocol error (malformed greeting, no usable security type, unknown result code).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server refused the connection; the payload is its reason verbatim.
    #[error("{0}")]
    ServerRefused(String),

    /// Authentication failed (wrong or missing password).
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Pointer input attempted before the handshake is Ready, after close, or in view-only mode.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// At least one step of the ordered close failed. The connection is still Disconnected.
    #[error("Error closing connection: {0}")]
    CloseFailed(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection has been closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RfbClientError {
    /// Returns true if this error is potentially retryable.
    ///
    /// Retryable errors are typically transient network issues that may
    /// succeed on a fresh `open`. The client never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::ConnectionFailed(_)
        )
    }

    /// Returns true if this is a fatal error that should not be retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }
}

impl From<HandshakeError> for RfbClientError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::Io(e) => Self::Transport(e),
            HandshakeError::Protocol(msg) => Self::Protocol(msg),
            HandshakeError::ServerRefused(reason) => Self::ServerRefused(reason),
            HandshakeError::AuthFailed(msg) => Self::AuthFailed(msg),
            HandshakeError::Terminated => Self::ConnectionClosed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        assert!(RfbClientError::Transport(io::Error::from(io::ErrorKind::ConnectionRefused))
            .is_retryable());
        assert!(RfbClientError::Timeout(std::time::Duration::from_secs(5)).is_retryable());
        assert!(RfbClientError::ConnectionFailed("refused".to_string()).is_retryable());

        assert!(RfbClientError::AuthFailed("wrong password".to_string()).is_fatal());
        assert!(RfbClientError::AddressFormat("1.2.3".to_string()).is_fatal());
        assert!(RfbClientError::ServerRefused("busy".to_string()).is_fatal());
        assert!(RfbClientError::Protocol("bad".to_string()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = RfbClientError::AuthFailed("wrong password".to_string());
        assert_eq!(err.to_string(), "Authentication failed: wrong password");

        let err = RfbClientError::Timeout(std::time::Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));

        let err = RfbClientError::ServerRefused("Too many clients".to_string());
        assert_eq!(err.to_string(), "Too many clients");
    }

    #[test]
    fn test_from_handshake_error() {
        let err: RfbClientError = HandshakeError::ServerRefused("no".into()).into();
        assert!(matches!(err, RfbClientError::ServerRefused(ref r) if r == "no"));

        let err: RfbClientError =
            HandshakeError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)).into();
        assert!(matches!(err, RfbClientError::Transport(_)));

        let err: RfbClientError = HandshakeError::Protocol("x".into()).into();
        assert!(matches!(err, RfbClientError::Protocol(_)));

        let err: RfbClientError = HandshakeError::AuthFailed("x".into()).into();
        assert!(matches!(err, RfbClientError::AuthFailed(_)));

        let err: RfbClientError = HandshakeError::Terminated.into();
        assert!(matches!(err, RfbClientError::ConnectionClosed));
    }
}
