//! RFB (Remote Framebuffer) protocol core.
//!
//! This crate provides the transport-agnostic part of a VNC client: exact-count
//! I/O over any tokio byte stream, the connection handshake as an explicit
//! state machine, VNC authentication, and pointer event encoding.
//!
//! # Modules
//!
//! - [`io`] - Exact-count reads/writes and big-endian decoding ([`RfbStream`])
//! - [`messages`] - Wire types exchanged during setup plus PointerEvent
//! - [`handshake`] - Greeting through ServerInit ([`Handshake`])
//! - [`auth`] - VNC DES challenge/response
//! - [`pointer`] - Button state tracking ([`PointerEncoder`])
//! - [`connection`] - Lifecycle state and allowed transitions
//! - [`errors`] - [`HandshakeError`]
//!
//! # Examples
//!
//! ```no_run
//! use rfb_protocol::{Handshake, PointerButton, PointerEncoder, RfbStream};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let socket = tokio::net::TcpStream::connect("127.0.0.1:5900").await?;
//! let mut stream = RfbStream::new(socket);
//!
//! let info = Handshake::new().run(&mut stream).await?;
//! println!("Connected to {}, {}x{}", info.server_name, info.width, info.height);
//!
//! let mut encoder = PointerEncoder::new();
//! encoder.encode(PointerButton::Left, true, 10, 10).write_to(&mut stream).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod connection;
pub mod errors;
pub mod handshake;
pub mod io;
pub mod messages;
pub mod pointer;

// Re-export commonly used types
pub use connection::{ConnectionLifecycle, ConnectionState};
pub use errors::HandshakeError;
pub use handshake::{Handshake, HandshakeState, Progress, Step};
pub use io::RfbStream;
pub use messages::{FrameBufferInfo, PointerEvent, ProtocolVersion, SecurityType};
pub use pointer::{ButtonMask, ButtonState, PointerButton, PointerEncoder};
