//! One open connection: the byte stream, its handshake, and its pointer state.

use crate::errors::RfbClientError;
use crate::messages::{EventSink, ServerEvent};
use crate::protocol_trace;
use crate::transport;
use rfb_protocol::handshake::{Handshake, Progress, Step};
use rfb_protocol::messages::{FrameBufferInfo, PointerEvent};
use rfb_protocol::pointer::{PointerButton, PointerEncoder};
use rfb_protocol::{HandshakeError, RfbStream};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Stream plus the per-connection protocol state.
///
/// A fresh session is created for every successful connect, so button state
/// never carries over from a previous connection.
pub(crate) struct Session<S = TcpStream> {
    stream: RfbStream<S>,
    handshake: Handshake,
    encoder: PointerEncoder,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    pub(crate) fn new(stream: S, password: Option<String>) -> Self {
        Self {
            stream: RfbStream::new(stream),
            handshake: Handshake::new().with_password(password),
            encoder: PointerEncoder::new(),
        }
    }

    /// Drive the handshake to Ready, emitting one status event per step.
    pub(crate) async fn run_handshake(
        &mut self,
        events: &EventSink,
    ) -> Result<FrameBufferInfo, HandshakeError> {
        loop {
            match self.handshake.step(&mut self.stream).await? {
                Step::Continue(progress) => {
                    trace_progress(&progress);
                    events.emit(ServerEvent::status(progress.to_string()));
                }
                Step::Ready(info) => {
                    protocol_trace::in_msg(
                        "ServerName",
                        &format!("name={:?} {}x{}", info.server_name, info.width, info.height),
                    );
                    return Ok(info);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_ready(&self) -> bool {
        self.handshake.is_ready()
    }

    /// Encode and send one pointer event.
    pub(crate) async fn send_pointer(
        &mut self,
        button: PointerButton,
        down: bool,
        x: u16,
        y: u16,
    ) -> Result<PointerEvent, RfbClientError> {
        if !self.handshake.is_ready() {
            return Err(RfbClientError::NotReady(format!(
                "handshake in state {}",
                self.handshake.state()
            )));
        }

        let event = self.encoder.encode(button, down, x, y);
        protocol_trace::out_msg(
            "PointerEvent",
            &format!("mask={:#05b} x={} y={}", event.button_mask, event.x, event.y),
        );
        protocol_trace::hexdump("OUT ", &event.to_bytes(), PointerEvent::LEN);
        event.write_to(&mut self.stream).await?;
        Ok(event)
    }
}

impl Session<TcpStream> {
    /// Release the socket in order: input, output, then the stream itself.
    pub(crate) fn close(self) -> Result<(), RfbClientError> {
        transport::close_ordered(self.stream.into_inner())
    }
}

fn trace_progress(progress: &Progress) {
    if !protocol_trace::enabled() {
        return;
    }
    let (name, fields) = match progress {
        Progress::Version(v) => ("Greeting", format!("version=3.{}", v.minor())),
        Progress::SecurityTypeCount(n) => ("SecurityTypeCount", format!("count={}", n)),
        Progress::SecurityTypeImposed(t) => ("SecurityType", format!("type={}", t.code())),
        Progress::SecurityTypeSelected(t) => ("SecurityTypes", format!("chosen={}", t.code())),
        Progress::AuthChallengeReceived => ("VncAuthChallenge", "len=16".to_string()),
        Progress::SecurityResult(code) => ("SecurityResult", format!("result={}", code)),
        Progress::FailureReasonLength(len) => ("FailureReasonLength", format!("len={}", len)),
        Progress::ServerInit { width, height } => {
            ("ServerInit", format!("width={} height={}", width, height))
        }
        Progress::GreetingEchoed => return protocol_trace::out_msg("GreetingEcho", "len=12"),
        Progress::SecurityTypeSent(t) => {
            return protocol_trace::out_msg("SecurityChoice", &format!("type={}", t.code()))
        }
        Progress::AuthResponseSent => return protocol_trace::out_msg("VncAuthResponse", "len=16"),
        Progress::ClientInitSent => return protocol_trace::out_msg("ClientInit", "shared=0"),
    };
    protocol_trace::in_msg(name, &fields);
}
