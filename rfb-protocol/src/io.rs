//! Exact-count I/O and big-endian decoding for RFB handshake traffic.
//!
//! Every handshake phase reads or writes a known number of bytes. This module
//! provides [`RfbStream`], which pairs the underlying byte stream with a single
//! reusable [`ScratchBuffer`] that stages every read and write, plus the pure
//! decoding helpers shared by all phases.
//!
//! # Wire conventions
//!
//! - Multi-byte integers are big-endian (network byte order).
//! - Strings are length-prefixed by a big-endian `u32` and carry one character
//!   per byte (ISO-8859-1). They are never decoded as UTF-8.
//!
//! # Examples
//!
//! ```no_run
//! use rfb_protocol::io::RfbStream;
//!
//! # async fn example<S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin>(socket: S) -> std::io::Result<()> {
//! let mut stream = RfbStream::new(socket);
//!
//! // Read the 12-byte server greeting
//! let greeting = stream.read_exact(12).await?.to_vec();
//!
//! // Echo it back unmodified
//! stream.write_exact(&greeting).await?;
//! # Ok(())
//! # }
//! ```

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Minimum capacity of the scratch buffer.
pub const SCRATCH_CAPACITY: usize = 64;

/// Largest length-prefixed string accepted from a server (1 MiB).
pub const MAX_STRING_LEN: usize = 1 << 20;

/// Reusable staging area for every wire read and write.
///
/// Contents are only meaningful for the duration of the operation that filled
/// them. [`RfbStream::read_exact`] hands out a borrow tied to `&mut self`, so
/// a phase cannot hold on to read data while another read or write reuses the
/// buffer.
#[derive(Debug)]
pub struct ScratchBuffer {
    bytes: BytesMut,
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchBuffer {
    /// Create a scratch buffer with [`SCRATCH_CAPACITY`] bytes reserved.
    pub fn new() -> Self {
        Self {
            bytes: BytesMut::with_capacity(SCRATCH_CAPACITY),
        }
    }

    /// Resize to exactly `len` zeroed bytes and return them for filling.
    ///
    /// Grows past the initial capacity when a phase needs more (long server
    /// names or failure reasons).
    fn prepare(&mut self, len: usize) -> &mut [u8] {
        self.bytes.clear();
        self.bytes.resize(len, 0);
        &mut self.bytes[..]
    }

    /// Replace the contents with `data`.
    fn stage(&mut self, data: &[u8]) -> &[u8] {
        self.bytes.clear();
        self.bytes.extend_from_slice(data);
        &self.bytes[..]
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}

/// Byte stream plus scratch buffer, the I/O primitive of the handshake.
///
/// Reads block (asynchronously) until exactly the requested count arrives;
/// a short read, EOF, or I/O error fails the call and never yields partial
/// data. Writes are flushed before returning.
pub struct RfbStream<S> {
    stream: S,
    scratch: ScratchBuffer,
}

impl<S: AsyncRead + AsyncWrite + Unpin> RfbStream<S> {
    /// Wrap a connected byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            scratch: ScratchBuffer::new(),
        }
    }

    /// Read exactly `len` bytes into the scratch buffer and return them.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::ErrorKind::UnexpectedEof`] if the stream ends first,
    /// or any error reported by the underlying stream.
    pub async fn read_exact(&mut self, len: usize) -> std::io::Result<&[u8]> {
        let buf = self.scratch.prepare(len);
        if len > 0 {
            self.stream.read_exact(buf).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("stream closed before {} bytes were read", len),
                    )
                } else {
                    e
                }
            })?;
        }
        Ok(&self.scratch.bytes[..])
    }

    /// Stage `data` in the scratch buffer, write all of it, and flush.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the underlying stream.
    pub async fn write_exact(&mut self, data: &[u8]) -> std::io::Result<()> {
        let staged = self.scratch.stage(data);
        self.stream.write_all(staged).await?;
        self.stream.flush().await
    }

    /// Read a single byte.
    pub async fn read_u8(&mut self) -> std::io::Result<u8> {
        let bytes = self.read_exact(1).await?;
        Ok(bytes[0])
    }

    /// Read a big-endian `u16`.
    pub async fn read_u16(&mut self) -> std::io::Result<u16> {
        let mut bytes = self.read_exact(2).await?;
        Ok(bytes.get_u16())
    }

    /// Read a big-endian `u32`.
    pub async fn read_u32(&mut self) -> std::io::Result<u32> {
        let mut bytes = self.read_exact(4).await?;
        Ok(bytes.get_u32())
    }

    /// Read a `u32` length prefix followed by that many 8-bit characters.
    ///
    /// # Errors
    ///
    /// Fails with [`std::io::ErrorKind::InvalidData`] if the length exceeds
    /// [`MAX_STRING_LEN`].
    pub async fn read_string(&mut self) -> std::io::Result<String> {
        let len = check_string_len(self.read_u32().await?)?;
        let bytes = self.read_exact(len).await?;
        Ok(decode_latin1(bytes))
    }

    /// Capacity of the scratch buffer (for diagnostics).
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.capacity()
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the wrapper and return the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Decode a big-endian `u16` from the first two bytes of `bytes`.
///
/// Returns `None` if fewer than two bytes are supplied.
pub fn decode_u16(bytes: &[u8]) -> Option<u16> {
    let mut buf = bytes.get(..2)?;
    Some(buf.get_u16())
}

/// Decode a big-endian `u32` from the first four bytes of `bytes`.
///
/// Returns `None` if fewer than four bytes are supplied.
pub fn decode_u32(bytes: &[u8]) -> Option<u32> {
    let mut buf = bytes.get(..4)?;
    Some(buf.get_u32())
}

/// Map each byte to the character with the same code point.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Validate a length prefix read from the wire.
pub fn check_string_len(len: u32) -> std::io::Result<usize> {
    let len = len as usize;
    if len > MAX_STRING_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "string length {} exceeds limit of {} bytes",
                len, MAX_STRING_LEN
            ),
        ));
    }
    Ok(len)
}
