//! Async VNC connection supervisor.
//!
//! This crate opens a TCP connection to a VNC server, runs the RFB handshake
//! from `rfb-protocol` in a background task, and then forwards pointer input.
//! Every phase transition and failure is reported as a [`ServerEvent`] on a
//! bounded channel that a UI can render as a single status line.
//!
//! # Features
//!
//! - **Async I/O**: Built on tokio; `open` never blocks the caller
//! - **Security types**: None and VNC password authentication
//! - **Strict address validation**: dotted-quad IPv4 and port text checked before any I/O
//! - **Configuration management**: TOML files and an optional `cli` feature
//! - **Fail-fast policy**: Clear error messages, no automatic retries
//!
//! # Quick Start
//!
//! ```no_run
//! use rfb_remote::{Config, RfbClient, ServerEvent};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::builder().password("secret").build()?;
//!     let client = RfbClient::new(config)?;
//!     client.open("192.168.1.100", "5900")?;
//!
//!     while let Ok(event) = client.events().recv_async().await {
//!         println!("{}", event);
//!         match event {
//!             ServerEvent::Connected { .. } | ServerEvent::Error { .. } => break,
//!             _ => {}
//!         }
//!     }
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Supervisor** ([`RfbClient`]): lifecycle state, address validation, open/close
//! - **Connection task**: connect with timeout, then step the handshake
//! - **Session**: the stream, its handshake state, and its pointer button state
//!
//! Closing aborts the connection task before the socket is shut down, so no
//! handshake phase runs after `close`.
//!
//! # Safety
//!
//! This crate is `#![forbid(unsafe_code)]` and uses only safe Rust.

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, clippy::all)]

// Public modules
pub mod address;
pub mod client;
pub mod config;
pub mod errors;
pub mod messages;
pub mod protocol_trace;
pub mod transport;

// Private implementation modules
mod session;

// Optional CLI support
#[cfg(feature = "cli")]
pub mod args;

// Re-exports
pub use address::TargetAddress;
pub use client::RfbClient;
pub use config::Config;
pub use errors::RfbClientError;
pub use messages::ServerEvent;
pub use rfb_protocol::{ConnectionState, FrameBufferInfo, PointerButton};
