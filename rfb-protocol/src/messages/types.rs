//! Core RFB handshake types.
//!
//! - [`ProtocolVersion`] - Minor version digit taken from the server greeting
//! - [`SecurityType`] - Security type codes this client understands
//! - Security result codes and fixed message lengths

use crate::errors::HandshakeError;
use std::fmt;

/// Length of the `RFB xxx.yyy\n` greeting.
pub const GREETING_LEN: usize = 12;

/// Length of the fixed part of ServerInit (everything before the name bytes).
pub const SERVER_INIT_LEN: usize = 24;

/// Length of the VNC authentication challenge and response.
pub const VNC_AUTH_CHALLENGE_LEN: usize = 16;

/// SecurityResult: handshake succeeded.
pub const SECURITY_RESULT_OK: u32 = 0;

/// SecurityResult: handshake failed.
pub const SECURITY_RESULT_FAILED: u32 = 1;

/// RFB protocol version as offered by the server.
///
/// Only the minor digit matters for the 3.x protocol family: 3 for RFB 3.3,
/// 7 for 3.7, and 8 for 3.8. Every later branch of the handshake compares
/// against this value.
///
/// # Examples
///
/// ```
/// use rfb_protocol::messages::types::ProtocolVersion;
///
/// let version = ProtocolVersion::from_greeting(b"RFB 003.008\n").unwrap();
/// assert_eq!(version, ProtocolVersion::V3_8);
/// assert!(version.has_security_list());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(u8);

impl ProtocolVersion {
    /// RFB 3.3 - server imposes the security type.
    pub const V3_3: Self = Self(3);
    /// RFB 3.7 - server offers a list of security types.
    pub const V3_7: Self = Self(7);
    /// RFB 3.8 - SecurityResult always sent, failure reasons included.
    pub const V3_8: Self = Self(8);

    /// Create a version from its minor digit.
    pub const fn new(minor: u8) -> Self {
        Self(minor)
    }

    /// Parse the 12-byte server greeting.
    ///
    /// The greeting must look like `RFB ddd.ddd\n`. The version is the byte
    /// at offset 10 minus ASCII `'0'`.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::Protocol`] if the greeting is malformed.
    pub fn from_greeting(greeting: &[u8]) -> Result<Self, HandshakeError> {
        let well_formed = greeting.len() == GREETING_LEN
            && &greeting[0..4] == b"RFB "
            && greeting[7] == b'.'
            && greeting[11] == b'\n'
            && greeting[4..7].iter().all(u8::is_ascii_digit)
            && greeting[8..11].iter().all(u8::is_ascii_digit);

        if !well_formed {
            return Err(HandshakeError::Protocol(format!(
                "invalid RFB greeting: expected 'RFB xxx.yyy\\n', got {:?}",
                String::from_utf8_lossy(greeting)
            )));
        }

        Ok(Self(greeting[10] - b'0'))
    }

    /// The minor version digit.
    pub const fn minor(self) -> u8 {
        self.0
    }

    /// 3.7 and later send a count-prefixed list of security types.
    pub fn has_security_list(self) -> bool {
        self >= Self::V3_7
    }

    /// 3.8 and later send SecurityResult even when `None` was chosen, and
    /// follow a failed SecurityResult with a reason string.
    pub fn has_extended_security_result(self) -> bool {
        self >= Self::V3_8
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "3.{}", self.0)
    }
}

/// Security types known to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SecurityType {
    /// Connection failed (server-side), or an invalid offer.
    Invalid = 0,
    /// No authentication.
    None = 1,
    /// DES challenge/response with a shared password.
    VncAuthentication = 2,
}

impl SecurityType {
    /// Map a wire code to a known security type.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Invalid),
            1 => Some(Self::None),
            2 => Some(Self::VncAuthentication),
            _ => None,
        }
    }

    /// The single-byte wire code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "Invalid"),
            Self::None => write!(f, "None"),
            Self::VncAuthentication => write!(f, "VNC Authentication"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_from_greeting() {
        assert_eq!(
            ProtocolVersion::from_greeting(b"RFB 003.008\n").unwrap(),
            ProtocolVersion::V3_8
        );
        assert_eq!(
            ProtocolVersion::from_greeting(b"RFB 003.007\n").unwrap(),
            ProtocolVersion::V3_7
        );
        assert_eq!(
            ProtocolVersion::from_greeting(b"RFB 003.003\n").unwrap(),
            ProtocolVersion::V3_3
        );
    }

    #[test]
    fn test_malformed_greetings() {
        assert!(ProtocolVersion::from_greeting(b"HTTP/1.1 200").is_err());
        assert!(ProtocolVersion::from_greeting(b"RFB 003.008 ").is_err());
        assert!(ProtocolVersion::from_greeting(b"RFB 003.00x\n").is_err());
        assert!(ProtocolVersion::from_greeting(b"RFB 003").is_err());
    }

    #[test]
    fn test_version_branching() {
        assert!(!ProtocolVersion::V3_3.has_security_list());
        assert!(ProtocolVersion::V3_7.has_security_list());
        assert!(!ProtocolVersion::V3_7.has_extended_security_result());
        assert!(ProtocolVersion::V3_8.has_extended_security_result());
        // 3.5 behaves like 3.3
        assert!(!ProtocolVersion::new(5).has_security_list());
        assert_eq!(ProtocolVersion::V3_8.to_string(), "3.8");
    }

    #[test]
    fn test_security_type_codes() {
        assert_eq!(SecurityType::from_code(0), Some(SecurityType::Invalid));
        assert_eq!(SecurityType::from_code(1), Some(SecurityType::None));
        assert_eq!(
            SecurityType::from_code(2),
            Some(SecurityType::VncAuthentication)
        );
        assert_eq!(SecurityType::from_code(16), None);
        assert_eq!(SecurityType::VncAuthentication.code(), 2);
    }
}
