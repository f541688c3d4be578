//! Client-to-server RFB messages.
//!
//! This module defines the messages this client sends after the greeting echo.

use super::types::SecurityType;
use crate::io::RfbStream;
use tokio::io::{AsyncRead, AsyncWrite};

/// PointerEvent message type byte.
pub const POINTER_EVENT_TYPE: u8 = 5;

/// Security type selection (RFB 3.7 and later).
///
/// # Wire Format
///
/// - 1 byte: chosen security type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityChoice {
    pub security_type: SecurityType,
}

impl SecurityChoice {
    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> [u8; 1] {
        [self.security_type.code()]
    }

    /// Write SecurityChoice to an RFB stream.
    pub async fn write_to<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        stream: &mut RfbStream<S>,
    ) -> std::io::Result<()> {
        stream.write_exact(&self.to_bytes()).await
    }
}

/// ClientInit message - client initialization.
///
/// Sent by the client after the security handshake. Indicates whether the
/// client wants a shared or exclusive connection.
///
/// # Wire Format
///
/// - 1 byte: shared flag (0 = exclusive, 1 = shared)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInit {
    pub shared: bool,
}

impl ClientInit {
    /// Exclusive access; other clients are disconnected by the server.
    pub const EXCLUSIVE: Self = Self { shared: false };

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> [u8; 1] {
        [u8::from(self.shared)]
    }

    /// Write ClientInit to an RFB stream.
    pub async fn write_to<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        stream: &mut RfbStream<S>,
    ) -> std::io::Result<()> {
        stream.write_exact(&self.to_bytes()).await
    }
}

/// PointerEvent message - mouse input.
///
/// Sends mouse position and the full current button state to the server.
///
/// # Wire Format
///
/// - 1 byte: message type (5)
/// - 1 byte: button mask (bit 0 = left, bit 1 = middle, bit 2 = right)
/// - 2 bytes: x position
/// - 2 bytes: y position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub button_mask: u8,
    pub x: u16,
    pub y: u16,
}

impl PointerEvent {
    /// Wire size in bytes.
    pub const LEN: usize = 6;

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let [x_hi, x_lo] = self.x.to_be_bytes();
        let [y_hi, y_lo] = self.y.to_be_bytes();
        [POINTER_EVENT_TYPE, self.button_mask, x_hi, x_lo, y_hi, y_lo]
    }

    /// Write PointerEvent to an RFB stream.
    pub async fn write_to<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        stream: &mut RfbStream<S>,
    ) -> std::io::Result<()> {
        stream.write_exact(&self.to_bytes()).await
    }
}
