//! Validation of caller-supplied address and port text.
//!
//! The address must be four dot-separated decimal octets (1 to 3 digits each,
//! leading zeros allowed, value 0..=255). The port must be 1 to 5 digits with
//! no leading zero and a value in 1..=65535. Surrounding whitespace is ignored.

use crate::errors::RfbClientError;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// A validated IPv4 target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetAddress {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl TargetAddress {
    /// Validate address and port text.
    ///
    /// # Errors
    ///
    /// [`RfbClientError::AddressFormat`] naming the offending field.
    pub fn parse(address: &str, port: &str) -> Result<Self, RfbClientError> {
        let ip = parse_ipv4(address.trim()).ok_or_else(|| {
            RfbClientError::AddressFormat(format!("invalid IPv4 address '{}'", address.trim()))
        })?;
        let port = parse_port(port.trim()).ok_or_else(|| {
            RfbClientError::AddressFormat(format!("invalid port '{}'", port.trim()))
        })?;
        Ok(Self { ip, port })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip, self.port))
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

fn parse_ipv4(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

fn parse_port(text: &str) -> Option<u16> {
    if text.is_empty()
        || text.len() > 5
        || text.starts_with('0')
        || !text.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    // 1..=65535 after the leading-zero check
    text.parse::<u16>().ok()
}
