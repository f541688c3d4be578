//! RFB connection handshake as an explicit state machine.
//!
//! The handshake runs from the server greeting through ServerInit:
//!
//! 1. **Protocol Version** - Read the 12-byte greeting and echo it unchanged
//! 2. **Security** - Read the offer (a list for 3.7+, an imposed type for 3.3),
//!    choose, optionally run VNC authentication, and read the SecurityResult
//! 3. **Initialization** - Send ClientInit, read ServerInit and the desktop name
//!
//! Each [`HandshakeState`] performs exactly one read or one write. Callers
//! advance the machine with [`Handshake::step`], which reports a [`Progress`]
//! value per state, or with [`Handshake::run`] to drive it to completion.
//!
//! # Version Branching
//!
//! The client never negotiates down: whatever the server offers is echoed
//! back, and its minor digit decides framing from then on.
//!
//! | Version | Security offer | SecurityResult after `None` | Failure reason after result 1 |
//! |---------|----------------|-----------------------------|-------------------------------|
//! | 3.3     | u32 imposed    | not sent                    | not sent                      |
//! | 3.7     | count + list   | not sent                    | not sent                      |
//! | 3.8     | count + list   | sent                        | sent                          |
//!
//! # Error Handling
//!
//! Any failure moves the machine to [`HandshakeState::Failed`]; it never
//! resumes. Server-supplied failure reasons are returned verbatim as
//! [`HandshakeError::ServerRefused`].
//!
//! # Examples
//!
//! ```no_run
//! use rfb_protocol::handshake::Handshake;
//! use rfb_protocol::io::RfbStream;
//!
//! # async fn example(socket: tokio::net::TcpStream) -> Result<(), rfb_protocol::HandshakeError> {
//! let mut stream = RfbStream::new(socket);
//! let mut handshake = Handshake::new().with_password(Some("secret".to_string()));
//! let info = handshake.run(&mut stream).await?;
//! println!("Connected to {}, {}x{}", info.server_name, info.width, info.height);
//! # Ok(())
//! # }
//! ```

use crate::auth::vnc_auth_response;
use crate::errors::HandshakeError;
use crate::io::{check_string_len, decode_latin1, RfbStream};
use crate::messages::client::{ClientInit, SecurityChoice};
use crate::messages::server::{FrameBufferInfo, ServerInitHeader};
use crate::messages::types::{
    ProtocolVersion, SecurityType, GREETING_LEN, SECURITY_RESULT_FAILED, SECURITY_RESULT_OK,
    SERVER_INIT_LEN, VNC_AUTH_CHALLENGE_LEN,
};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Handshake position. Each non-terminal state owns exactly the data its
/// single read or write needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// Read the 12-byte greeting.
    Greeting,
    /// Write the greeting back.
    GreetingEcho { greeting: [u8; GREETING_LEN] },
    /// Read the security count (3.7+) or the imposed type (3.3).
    SecurityOffer,
    /// Read `count` offered type codes.
    SecurityTypes { count: u8 },
    /// Write the chosen type code.
    SecuritySelection { chosen: SecurityType },
    /// Read the 16-byte VNC authentication challenge.
    AuthChallenge,
    /// Write the encrypted challenge.
    AuthResponse {
        response: [u8; VNC_AUTH_CHALLENGE_LEN],
    },
    /// Read the u32 SecurityResult.
    SecurityResult,
    /// Read the u32 length of the failure reason.
    FailureReasonLength,
    /// Read the failure reason bytes.
    FailureReason { length: usize },
    /// Write ClientInit.
    ClientInit,
    /// Read the fixed 24-byte part of ServerInit.
    ServerInit,
    /// Read the desktop name.
    ServerName {
        width: u16,
        height: u16,
        length: usize,
    },
    /// Handshake complete.
    Ready(FrameBufferInfo),
    /// Handshake aborted.
    Failed,
}

impl HandshakeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greeting => write!(f, "Greeting"),
            Self::GreetingEcho { .. } => write!(f, "GreetingEcho"),
            Self::SecurityOffer => write!(f, "SecurityOffer"),
            Self::SecurityTypes { count } => write!(f, "SecurityTypes({})", count),
            Self::SecuritySelection { chosen } => write!(f, "SecuritySelection({})", chosen),
            Self::AuthChallenge => write!(f, "AuthChallenge"),
            Self::AuthResponse { .. } => write!(f, "AuthResponse"),
            Self::SecurityResult => write!(f, "SecurityResult"),
            Self::FailureReasonLength => write!(f, "FailureReasonLength"),
            Self::FailureReason { length } => write!(f, "FailureReason({} bytes)", length),
            Self::ClientInit => write!(f, "ClientInit"),
            Self::ServerInit => write!(f, "ServerInit"),
            Self::ServerName { length, .. } => write!(f, "ServerName({} bytes)", length),
            Self::Ready(_) => write!(f, "Ready"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// What a single step accomplished. Rendered as the status line for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Version(ProtocolVersion),
    GreetingEchoed,
    SecurityTypeCount(u8),
    SecurityTypeImposed(SecurityType),
    SecurityTypeSelected(SecurityType),
    SecurityTypeSent(SecurityType),
    AuthChallengeReceived,
    AuthResponseSent,
    SecurityResult(u32),
    FailureReasonLength(usize),
    ClientInitSent,
    ServerInit { width: u16, height: u16 },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(v) => write!(f, "Protocol Version: {}", v.minor()),
            Self::GreetingEchoed => write!(f, "Protocol version echoed"),
            Self::SecurityTypeCount(n) => write!(f, "Security types offered: {}", n),
            Self::SecurityTypeImposed(t) => write!(f, "Security type imposed by server: {}", t),
            Self::SecurityTypeSelected(t) => write!(f, "Security type selected: {}", t),
            Self::SecurityTypeSent(t) => write!(f, "Security type sent: {}", t),
            Self::AuthChallengeReceived => write!(f, "Authentication challenge received"),
            Self::AuthResponseSent => write!(f, "Authentication response sent"),
            Self::SecurityResult(code) => write!(f, "Security result: {}", code),
            Self::FailureReasonLength(len) => {
                write!(f, "Server sent failure reason ({} bytes)", len)
            }
            Self::ClientInitSent => write!(f, "ClientInit sent"),
            Self::ServerInit { width, height } => write!(f, "ServerInit: {}x{}", width, height),
        }
    }
}

/// Result of one [`Handshake::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(Progress),
    Ready(FrameBufferInfo),
}

/// Pick the security type from a 3.7+ offer.
///
/// VNC authentication wins over None regardless of order.
///
/// # Errors
///
/// [`HandshakeError::Protocol`] when nothing usable is offered.
pub fn select_security_type(offered: &[u8]) -> Result<SecurityType, HandshakeError> {
    let has = |t: SecurityType| offered.contains(&t.code());

    if has(SecurityType::VncAuthentication) {
        Ok(SecurityType::VncAuthentication)
    } else if has(SecurityType::None) {
        Ok(SecurityType::None)
    } else if has(SecurityType::Invalid) {
        Err(HandshakeError::Protocol(
            "Server reported Invalid security type option".to_string(),
        ))
    } else {
        Err(HandshakeError::Protocol(format!(
            "No security options supported (offered {:?})",
            offered
        )))
    }
}

/// Handshake driver for one connection.
///
/// Holds the negotiated facts; the stream and its scratch buffer are passed
/// to every [`step`](Self::step).
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    version: Option<ProtocolVersion>,
    security: Option<SecurityType>,
    password: Option<String>,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Greeting,
            version: None,
            security: None,
            password: None,
        }
    }

    /// Password used if VNC authentication is selected.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Version offered by the server, once the greeting has been read.
    pub fn version(&self) -> Option<ProtocolVersion> {
        self.version
    }

    /// Security type in use, once chosen or imposed.
    pub fn security_type(&self) -> Option<SecurityType> {
        self.security
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, HandshakeState::Ready(_))
    }

    /// Frame-buffer info, only available once Ready.
    pub fn frame_buffer(&self) -> Option<&FrameBufferInfo> {
        match &self.state {
            HandshakeState::Ready(info) => Some(info),
            _ => None,
        }
    }

    /// Perform the current state's single read or write and advance.
    ///
    /// # Errors
    ///
    /// Any error leaves the machine in [`HandshakeState::Failed`]; calling
    /// `step` again returns [`HandshakeError::Terminated`]. Dropping the
    /// returned future mid-I/O has the same effect.
    pub async fn step<S: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        stream: &mut RfbStream<S>,
    ) -> Result<Step, HandshakeError> {
        let current = std::mem::replace(&mut self.state, HandshakeState::Failed);
        let from = current.to_string();

        match self.advance(current, stream).await {
            Ok((next, step)) => {
                debug!("handshake: {} -> {}", from, next);
                self.state = next;
                Ok(step)
            }
            Err(e) => {
                if !matches!(e, HandshakeError::Terminated) {
                    debug!("handshake: {} -> Failed ({})", from, e);
                }
                Err(e)
            }
        }
    }

    /// Step until Ready or failure.
    pub async fn run<S: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        stream: &mut RfbStream<S>,
    ) -> Result<FrameBufferInfo, HandshakeError> {
        loop {
            if let Step::Ready(info) = self.step(stream).await? {
                return Ok(info);
            }
        }
    }

    fn negotiated(&self) -> Result<ProtocolVersion, HandshakeError> {
        self.version.ok_or_else(|| {
            HandshakeError::Protocol("protocol version not negotiated".to_string())
        })
    }

    /// State that follows a chosen or imposed security type.
    fn after_security(&self, chosen: SecurityType) -> Result<HandshakeState, HandshakeError> {
        match chosen {
            SecurityType::VncAuthentication => {
                if self.password.is_none() {
                    return Err(HandshakeError::AuthFailed(
                        "server requires a password but none is configured".to_string(),
                    ));
                }
                Ok(HandshakeState::AuthChallenge)
            }
            SecurityType::None => {
                if self.negotiated()?.has_extended_security_result() {
                    Ok(HandshakeState::SecurityResult)
                } else {
                    Ok(HandshakeState::ClientInit)
                }
            }
            SecurityType::Invalid => Err(HandshakeError::Protocol(
                "Server reported Invalid security type option".to_string(),
            )),
        }
    }

    async fn advance<S: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        state: HandshakeState,
        stream: &mut RfbStream<S>,
    ) -> Result<(HandshakeState, Step), HandshakeError> {
        use HandshakeState as H;

        let next = match state {
            H::Greeting => {
                let bytes = stream.read_exact(GREETING_LEN).await?;
                let version = ProtocolVersion::from_greeting(bytes)?;
                let mut greeting = [0u8; GREETING_LEN];
                greeting.copy_from_slice(bytes);
                self.version = Some(version);
                (H::GreetingEcho { greeting }, Progress::Version(version))
            }

            H::GreetingEcho { greeting } => {
                stream.write_exact(&greeting).await?;
                (H::SecurityOffer, Progress::GreetingEchoed)
            }

            H::SecurityOffer => {
                if self.negotiated()?.has_security_list() {
                    let count = stream.read_u8().await?;
                    let next = if count == 0 {
                        H::FailureReasonLength
                    } else {
                        H::SecurityTypes { count }
                    };
                    (next, Progress::SecurityTypeCount(count))
                } else {
                    let code = stream.read_u32().await?;
                    let imposed = SecurityType::from_code(code).ok_or_else(|| {
                        HandshakeError::Protocol(format!("Unsupported security type: {}", code))
                    })?;
                    let next = if imposed == SecurityType::Invalid {
                        H::FailureReasonLength
                    } else {
                        self.security = Some(imposed);
                        self.after_security(imposed)?
                    };
                    (next, Progress::SecurityTypeImposed(imposed))
                }
            }

            H::SecurityTypes { count } => {
                let offered = stream.read_exact(usize::from(count)).await?;
                debug!("security types offered: {:?}", offered);
                let chosen = select_security_type(offered)?;
                self.security = Some(chosen);
                (
                    H::SecuritySelection { chosen },
                    Progress::SecurityTypeSelected(chosen),
                )
            }

            H::SecuritySelection { chosen } => {
                SecurityChoice {
                    security_type: chosen,
                }
                .write_to(stream)
                .await?;
                (self.after_security(chosen)?, Progress::SecurityTypeSent(chosen))
            }

            H::AuthChallenge => {
                let password = self.password.as_deref().ok_or_else(|| {
                    HandshakeError::AuthFailed("no password configured".to_string())
                })?;
                let bytes = stream.read_exact(VNC_AUTH_CHALLENGE_LEN).await?;
                let mut challenge = [0u8; VNC_AUTH_CHALLENGE_LEN];
                challenge.copy_from_slice(bytes);
                let response = vnc_auth_response(password, &challenge);
                (H::AuthResponse { response }, Progress::AuthChallengeReceived)
            }

            H::AuthResponse { response } => {
                stream.write_exact(&response).await?;
                (H::SecurityResult, Progress::AuthResponseSent)
            }

            H::SecurityResult => {
                let code = stream.read_u32().await?;
                let next = match code {
                    SECURITY_RESULT_OK => H::ClientInit,
                    SECURITY_RESULT_FAILED => {
                        if self.negotiated()?.has_extended_security_result() {
                            H::FailureReasonLength
                        } else {
                            warn!("security handshake rejected without a reason");
                            return Err(HandshakeError::AuthFailed(
                                "server rejected the security handshake".to_string(),
                            ));
                        }
                    }
                    other => {
                        return Err(HandshakeError::Protocol(format!(
                            "Unrecognized security result: {}",
                            other
                        )))
                    }
                };
                (next, Progress::SecurityResult(code))
            }

            H::FailureReasonLength => {
                let length = check_string_len(stream.read_u32().await?)
                    .map_err(HandshakeError::from_codec)?;
                (
                    H::FailureReason { length },
                    Progress::FailureReasonLength(length),
                )
            }

            H::FailureReason { length } => {
                let reason = decode_latin1(stream.read_exact(length).await?);
                warn!("server refused connection: {}", reason);
                return Err(HandshakeError::ServerRefused(reason));
            }

            H::ClientInit => {
                ClientInit::EXCLUSIVE.write_to(stream).await?;
                (H::ServerInit, Progress::ClientInitSent)
            }

            H::ServerInit => {
                let bytes = stream.read_exact(SERVER_INIT_LEN).await?;
                let header = ServerInitHeader::decode(bytes).map_err(HandshakeError::from_codec)?;
                let length =
                    check_string_len(header.name_length).map_err(HandshakeError::from_codec)?;
                let (width, height) = (header.framebuffer_width, header.framebuffer_height);
                (
                    H::ServerName {
                        width,
                        height,
                        length,
                    },
                    Progress::ServerInit { width, height },
                )
            }

            H::ServerName {
                width,
                height,
                length,
            } => {
                let server_name = decode_latin1(stream.read_exact(length).await?);
                let info = FrameBufferInfo {
                    width,
                    height,
                    server_name,
                };
                info!(
                    "handshake complete: '{}' {}x{}",
                    info.server_name, info.width, info.height
                );
                return Ok((H::Ready(info.clone()), Step::Ready(info)));
            }

            H::Ready(info) => return Ok((H::Ready(info.clone()), Step::Ready(info))),

            H::Failed => return Err(HandshakeError::Terminated),
        };

        Ok((next.0, Step::Continue(next.1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    /// Client stream plus the server end, with `script` already queued for
    /// the client to read.
    async fn scripted(script: &[u8]) -> (RfbStream<DuplexStream>, DuplexStream) {
        let (client, mut server) = tokio::io::duplex(4096);
        server.write_all(script).await.unwrap();
        (RfbStream::new(client), server)
    }

    async fn client_output(server: &mut DuplexStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        server.read_exact(&mut buf).await.unwrap();
        buf
    }

    fn server_init(width: u16, height: u16, name: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&(name.len() as u32).to_be_bytes());
        bytes.extend_from_slice(name);
        bytes
    }

    fn reason(text: &[u8]) -> Vec<u8> {
        let mut bytes = (text.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(text);
        bytes
    }

    #[test]
    fn test_select_prefers_vnc_auth() {
        assert_eq!(
            select_security_type(&[1, 2]).unwrap(),
            SecurityType::VncAuthentication
        );
        assert_eq!(
            select_security_type(&[2, 1]).unwrap(),
            SecurityType::VncAuthentication
        );
        assert_eq!(select_security_type(&[1]).unwrap(), SecurityType::None);
        assert_eq!(select_security_type(&[19, 1, 16]).unwrap(), SecurityType::None);
    }

    #[test]
    fn test_select_rejects_unusable_offers() {
        let err = select_security_type(&[]).unwrap_err();
        assert!(matches!(err, HandshakeError::Protocol(_)));

        let err = select_security_type(&[0]).unwrap_err();
        assert_eq!(err.to_string(), "Server reported Invalid security type option");

        let err = select_security_type(&[16, 19]).unwrap_err();
        assert!(err.to_string().starts_with("No security options supported"));
    }

    #[tokio::test]
    async fn test_full_handshake_3_8_none() {
        let mut script = b"RFB 003.008\n".to_vec();
        script.extend_from_slice(&[1, 1]); // one type: None
        script.extend_from_slice(&0u32.to_be_bytes());
        script.extend_from_slice(&server_init(1920, 1080, b"Test1"));
        let (mut stream, mut server) = scripted(&script).await;

        let mut handshake = Handshake::new();
        let info = handshake.run(&mut stream).await.unwrap();

        assert_eq!(
            info,
            FrameBufferInfo {
                width: 1920,
                height: 1080,
                server_name: "Test1".to_string(),
            }
        );
        assert!(handshake.is_ready());
        assert_eq!(handshake.version(), Some(ProtocolVersion::V3_8));
        assert_eq!(handshake.security_type(), Some(SecurityType::None));
        assert_eq!(handshake.frame_buffer(), Some(&info));

        // echo + selection + ClientInit
        let out = client_output(&mut server, 14).await;
        assert_eq!(&out[..12], b"RFB 003.008\n");
        assert_eq!(out[12..], [1, 0]);
    }

    #[tokio::test]
    async fn test_3_7_none_skips_security_result() {
        let mut script = b"RFB 003.007\n".to_vec();
        script.extend_from_slice(&[1, 1]);
        script.extend_from_slice(&server_init(800, 600, b"seven"));
        let (mut stream, mut server) = scripted(&script).await;

        let info = Handshake::new().run(&mut stream).await.unwrap();
        assert_eq!((info.width, info.height), (800, 600));
        assert_eq!(info.server_name, "seven");

        let out = client_output(&mut server, 14).await;
        assert_eq!(&out[..12], b"RFB 003.007\n");
    }

    #[tokio::test]
    async fn test_3_3_imposed_none() {
        let mut script = b"RFB 003.003\n".to_vec();
        script.extend_from_slice(&1u32.to_be_bytes());
        script.extend_from_slice(&server_init(640, 480, b"old"));
        let (mut stream, mut server) = scripted(&script).await;

        let mut handshake = Handshake::new();
        let info = handshake.run(&mut stream).await.unwrap();
        assert_eq!(info.server_name, "old");
        assert_eq!(handshake.version(), Some(ProtocolVersion::V3_3));

        // echo + ClientInit only; no selection byte on 3.3
        let out = client_output(&mut server, 13).await;
        assert_eq!(&out[..12], b"RFB 003.003\n");
        assert_eq!(out[12], 0);
    }

    #[tokio::test]
    async fn test_step_by_step_states() {
        let mut script = b"RFB 003.008\n".to_vec();
        script.extend_from_slice(&[1, 1]);
        script.extend_from_slice(&0u32.to_be_bytes());
        script.extend_from_slice(&server_init(2, 3, b"x"));
        let (mut stream, _server) = scripted(&script).await;

        let mut handshake = Handshake::new();
        let mut progress = Vec::new();
        loop {
            match handshake.step(&mut stream).await.unwrap() {
                Step::Continue(p) => progress.push(p),
                Step::Ready(_) => break,
            }
        }

        assert_eq!(
            progress,
            vec![
                Progress::Version(ProtocolVersion::V3_8),
                Progress::GreetingEchoed,
                Progress::SecurityTypeCount(1),
                Progress::SecurityTypeSelected(SecurityType::None),
                Progress::SecurityTypeSent(SecurityType::None),
                Progress::SecurityResult(0),
                Progress::ClientInitSent,
                Progress::ServerInit {
                    width: 2,
                    height: 3
                },
            ]
        );
        assert_eq!(progress[0].to_string(), "Protocol Version: 8");
    }

    #[tokio::test]
    async fn test_zero_security_types_reads_reason() {
        let mut script = b"RFB 003.008\n".to_vec();
        script.push(0);
        script.extend_from_slice(&reason(b"Too many security failures"));
        let (mut stream, _server) = scripted(&script).await;

        let err = Handshake::new().run(&mut stream).await.unwrap_err();
        match err {
            HandshakeError::ServerRefused(reason) => {
                assert_eq!(reason, "Too many security failures")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_3_3_invalid_type_reads_reason() {
        let mut script = b"RFB 003.003\n".to_vec();
        script.extend_from_slice(&0u32.to_be_bytes());
        script.extend_from_slice(&reason(&[b'n', b'o', 0xE9]));
        let (mut stream, _server) = scripted(&script).await;

        let err = Handshake::new().run(&mut stream).await.unwrap_err();
        assert_eq!(err.to_string(), "no\u{e9}");
    }

    #[tokio::test]
    async fn test_3_3_unsupported_type() {
        let mut script = b"RFB 003.003\n".to_vec();
        script.extend_from_slice(&16u32.to_be_bytes());
        let (mut stream, _server) = scripted(&script).await;

        let err = Handshake::new().run(&mut stream).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_security_result_failure_3_8() {
        let mut script = b"RFB 003.008\n".to_vec();
        script.extend_from_slice(&[1, 1]);
        script.extend_from_slice(&1u32.to_be_bytes());
        script.extend_from_slice(&reason(b"denied"));
        let (mut stream, _server) = scripted(&script).await;

        let err = Handshake::new().run(&mut stream).await.unwrap_err();
        assert!(matches!(err, HandshakeError::ServerRefused(ref r) if r == "denied"));
    }

    #[tokio::test]
    async fn test_unrecognized_security_result() {
        let mut script = b"RFB 003.008\n".to_vec();
        script.extend_from_slice(&[1, 1]);
        script.extend_from_slice(&7u32.to_be_bytes());
        let (mut stream, _server) = scripted(&script).await;

        let err = Handshake::new().run(&mut stream).await.unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized security result: 7");
    }

    #[tokio::test]
    async fn test_vnc_auth_3_8() {
        let challenge: [u8; 16] = *b"0123456789abcdef";
        let mut script = b"RFB 003.008\n".to_vec();
        script.extend_from_slice(&[2, 1, 2]);
        script.extend_from_slice(&challenge);
        script.extend_from_slice(&0u32.to_be_bytes());
        script.extend_from_slice(&server_init(1024, 768, b"auth"));
        let (mut stream, mut server) = scripted(&script).await;

        let mut handshake = Handshake::new().with_password(Some("secret".to_string()));
        let info = handshake.run(&mut stream).await.unwrap();
        assert_eq!(info.server_name, "auth");
        assert_eq!(
            handshake.security_type(),
            Some(SecurityType::VncAuthentication)
        );

        let out = client_output(&mut server, 12 + 1 + 16 + 1).await;
        assert_eq!(out[12], 2);
        assert_eq!(out[13..29], vnc_auth_response("secret", &challenge));
        assert_eq!(out[29], 0);
    }

    #[tokio::test]
    async fn test_vnc_auth_rejected_3_3() {
        let mut script = b"RFB 003.003\n".to_vec();
        script.extend_from_slice(&2u32.to_be_bytes());
        script.extend_from_slice(&[0u8; 16]);
        script.extend_from_slice(&1u32.to_be_bytes());
        let (mut stream, _server) = scripted(&script).await;

        let err = Handshake::new()
            .with_password(Some("wrong".to_string()))
            .run(&mut stream)
            .await
            .unwrap_err();
        assert!(matches!(err, HandshakeError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_vnc_auth_without_password_fails_fast() {
        let mut script = b"RFB 003.008\n".to_vec();
        script.extend_from_slice(&[1, 2]);
        let (mut stream, mut server) = scripted(&script).await;

        let mut handshake = Handshake::new();
        let err = handshake.run(&mut stream).await.unwrap_err();
        assert!(matches!(err, HandshakeError::AuthFailed(_)));
        assert_eq!(handshake.state(), &HandshakeState::Failed);

        // The selection byte went out, nothing else
        let out = client_output(&mut server, 13).await;
        assert_eq!(out[12], 2);
    }

    #[tokio::test]
    async fn test_failed_handshake_is_terminal() {
        let (mut stream, server) = scripted(b"RFB 003").await;
        drop(server);

        let mut handshake = Handshake::new();
        let err = handshake.step(&mut stream).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Io(_)));
        assert_eq!(handshake.state(), &HandshakeState::Failed);

        let err = handshake.step(&mut stream).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Terminated));
    }

    #[tokio::test]
    async fn test_malformed_greeting() {
        let (mut stream, _server) = scripted(b"SSH-2.0-xxxx").await;
        let err = Handshake::new().run(&mut stream).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_oversized_name_rejected() {
        let mut script = b"RFB 003.007\n".to_vec();
        script.extend_from_slice(&[1, 1]);
        script.extend_from_slice(&[0, 1, 0, 1]);
        script.extend_from_slice(&[0u8; 16]);
        script.extend_from_slice(&u32::MAX.to_be_bytes());
        let (mut stream, _server) = scripted(&script).await;

        let err = Handshake::new().run(&mut stream).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_unusual_minor_digit_follows_3_3_rules() {
        let mut script = b"RFB 003.005\n".to_vec();
        script.extend_from_slice(&1u32.to_be_bytes());
        script.extend_from_slice(&server_init(1, 1, b""));
        let (mut stream, _server) = scripted(&script).await;

        let mut handshake = Handshake::new();
        let info = handshake.run(&mut stream).await.unwrap();
        assert_eq!(info.server_name, "");
        assert_eq!(handshake.version().map(|v| v.minor()), Some(5));
    }
}
