//! Connection lifecycle state.
//!
//! The supervisor owns exactly one [`ConnectionState`] at a time and moves it
//! only along these edges:
//!
//! 1. **Disconnected -> Connecting** - `open` accepted the address
//! 2. **Connecting -> Connected** - the byte stream is open
//! 3. **Connecting -> Disconnected** - the stream could not be opened
//! 4. **Connected -> Disconnected** - `close`
//!
//! Handshake progress is tracked separately by
//! [`HandshakeState`](crate::handshake::HandshakeState); a connection can be
//! Connected while its handshake has failed.
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::connection::{ConnectionLifecycle, ConnectionState};
//!
//! let mut lifecycle = ConnectionLifecycle::new();
//! lifecycle.transition_to(ConnectionState::Connecting).unwrap();
//! lifecycle.transition_to(ConnectionState::Connected).unwrap();
//! assert!(lifecycle.transition_to(ConnectionState::Connecting).is_err());
//! ```

use std::fmt;
use thiserror::Error;

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No stream; `open` is accepted.
    #[default]
    Disconnected,

    /// Stream being established.
    Connecting,

    /// Stream open; the handshake runs or has finished.
    Connected,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid state transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Holder of the current [`ConnectionState`] that enforces the edges above.
#[derive(Debug, Clone, Default)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
}

impl ConnectionLifecycle {
    /// Start Disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the connection is in a specific state.
    pub fn is_state(&self, state: ConnectionState) -> bool {
        self.state == state
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] and leaves the state unchanged if the edge
    /// is not allowed.
    pub fn transition_to(&mut self, next: ConnectionState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Return to Disconnected from any state.
    ///
    /// Releasing resources never fails to release state.
    pub fn force_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}
