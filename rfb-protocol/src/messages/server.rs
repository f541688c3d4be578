//! Server-to-client RFB messages.

use super::types::SERVER_INIT_LEN;
use bytes::Buf;

/// Fixed-size prefix of the ServerInit message.
///
/// # Wire Format
///
/// - 2 bytes: framebuffer width
/// - 2 bytes: framebuffer height
/// - 16 bytes: PixelFormat (not used by this client)
/// - 4 bytes: name length
///
/// The `name_length` bytes of the desktop name follow on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInitHeader {
    pub framebuffer_width: u16,
    pub framebuffer_height: u16,
    pub name_length: u32,
}

impl ServerInitHeader {
    /// Decode the 24-byte ServerInit prefix.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::ErrorKind::InvalidData`] if fewer than 24 bytes are supplied.
    pub fn decode(bytes: &[u8]) -> std::io::Result<Self> {
        if bytes.len() < SERVER_INIT_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "ServerInit needs {} bytes, got {}",
                    SERVER_INIT_LEN,
                    bytes.len()
                ),
            ));
        }

        let mut buf = bytes;
        let framebuffer_width = buf.get_u16();
        let framebuffer_height = buf.get_u16();
        buf.advance(16); // pixel format
        let name_length = buf.get_u32();

        Ok(Self {
            framebuffer_width,
            framebuffer_height,
            name_length,
        })
    }
}

/// Frame-buffer geometry and desktop name, the result of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBufferInfo {
    pub width: u16,
    pub height: u16,
    pub server_name: String,
}
