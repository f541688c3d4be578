//! Error types for the RFB handshake.

use std::io;
use thiserror::Error;

/// Errors that abort the handshake.
///
/// Every variant is terminal: once [`crate::handshake::Handshake::step`]
/// returns one of these, later calls return [`HandshakeError::Terminated`].
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Short read, EOF, or stream fault during an active phase.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed greeting, unsupported security type, unrecognized result code.
    #[error("{0}")]
    Protocol(String),

    /// The server refused the connection and sent this reason.
    #[error("{0}")]
    ServerRefused(String),

    /// VNC authentication could not complete.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The handshake already failed.
    #[error("handshake already terminated")]
    Terminated,
}

impl HandshakeError {
    /// Map a codec error to the handshake error kind it represents.
    ///
    /// Oversized length prefixes are protocol violations, everything else is
    /// a transport fault.
    pub fn from_codec(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::InvalidData {
            Self::Protocol(err.to_string())
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_refused_displays_reason_only() {
        let err = HandshakeError::ServerRefused("Too many connections".into());
        assert_eq!(err.to_string(), "Too many connections");
    }

    #[test]
    fn test_from_codec() {
        let err = HandshakeError::from_codec(io::Error::new(io::ErrorKind::InvalidData, "too long"));
        assert!(matches!(err, HandshakeError::Protocol(_)));

        let err = HandshakeError::from_codec(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, HandshakeError::Io(_)));
    }
}
