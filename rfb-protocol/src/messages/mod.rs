//! RFB protocol message types.
//!
//! This module provides the wire types exchanged during connection setup and
//! the one input message this client sends afterwards:
//!
//! - **Core types** ([`types`]) - Protocol version, security types, fixed lengths
//! - **Server messages** ([`server`]) - ServerInit prefix and the resulting frame-buffer info
//! - **Client messages** ([`client`]) - Security choice, ClientInit, PointerEvent
//!
//! # Wire Format Rules
//!
//! 1. **Big-endian byte order** - All multi-byte integers use network byte order
//! 2. **8-bit strings** - Names and reasons carry one character per byte
//! 3. **Fail-fast errors** - Invalid data results in errors, no defensive fallbacks
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::messages::client::PointerEvent;
//!
//! let event = PointerEvent { button_mask: 0b001, x: 100, y: 200 };
//! assert_eq!(event.to_bytes(), [5, 1, 0, 100, 0, 200]);
//! ```

pub mod client;
pub mod server;
pub mod types;

#[cfg(test)]
mod proptest_framing;

pub use client::{ClientInit, PointerEvent, SecurityChoice};
pub use server::{FrameBufferInfo, ServerInitHeader};
pub use types::{ProtocolVersion, SecurityType};
