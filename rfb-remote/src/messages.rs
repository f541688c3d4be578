//! Status events delivered from the client to the application.

use std::fmt;

/// Events sent from the VNC client to the application.
///
/// Every phase transition and every failure produces exactly one event. The
/// UI renders [`ServerEvent::status_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A phase transition.
    Status {
        /// Human-readable description of the phase.
        message: String,
    },

    /// Handshake reached Ready.
    Connected {
        /// Framebuffer width in pixels.
        width: u16,
        /// Framebuffer height in pixels.
        height: u16,
        /// Server name/description.
        name: String,
    },

    /// An error occurred.
    ///
    /// For server refusals the message is exactly the server's reason.
    Error {
        /// The error message.
        message: String,
    },

    /// The connection has been closed.
    Disconnected,
}

impl ServerEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The single status line shown to the user.
    pub fn status_text(&self) -> String {
        match self {
            Self::Status { message } | Self::Error { message } => message.clone(),
            Self::Connected {
                width,
                height,
                name,
            } => format!("Connected to {}, {}x{}", name, width, height),
            Self::Disconnected => "Connection closed".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_text())
    }
}

/// Sending half of the status channel.
///
/// Sends never block the handshake: when the application stops draining and
/// the bounded channel is full, new events are dropped.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: flume::Sender<ServerEvent>,
}

impl EventSink {
    /// Create a sink and its receiver with room for `capacity` events.
    pub(crate) fn bounded(capacity: usize) -> (Self, flume::Receiver<ServerEvent>) {
        let (tx, rx) = flume::bounded(capacity);
        (Self { tx }, rx)
    }

    pub(crate) fn emit(&self, event: ServerEvent) {
        tracing::debug!("status: {}", event);
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(event)) => {
                tracing::debug!("status channel full, dropping: {}", event);
            }
            Err(flume::TrySendError::Disconnected(_)) => {}
        }
    }
}
