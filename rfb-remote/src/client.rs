//! Connection supervisor.
//!
//! [`RfbClient`] owns the lifecycle of one connection at a time. `open`
//! validates the target and returns immediately; a background task connects
//! with the configured timeout and runs the handshake. Status goes out on the
//! event channel at every phase transition and every failure.

use crate::address::TargetAddress;
use crate::config::Config;
use crate::errors::RfbClientError;
use crate::messages::{EventSink, ServerEvent};
use crate::session::Session;
use crate::transport;
use parking_lot::Mutex;
use rfb_protocol::connection::{ConnectionLifecycle, ConnectionState};
use rfb_protocol::messages::FrameBufferInfo;
use rfb_protocol::pointer::PointerButton;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the status channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Lifecycle {
    connection: ConnectionLifecycle,
    ready: bool,
    closing: bool,
    frame_buffer: Option<FrameBufferInfo>,
    worker: Option<JoinHandle<()>>,
}

struct Inner {
    config: Config,
    runtime: Handle,
    events: EventSink,
    events_rx: flume::Receiver<ServerEvent>,
    lifecycle: Mutex<Lifecycle>,
    session: tokio::sync::Mutex<Option<Session>>,
    /// Raised by `close` before it waits for the session, so an in-flight
    /// pointer write gives the session up.
    close_signal: watch::Sender<bool>,
}

/// Handle to the connection supervisor.
///
/// Cheap to clone; all clones drive the same connection.
///
/// # Examples
///
/// ```no_run
/// use rfb_remote::{Config, RfbClient, ServerEvent};
/// use rfb_protocol::PointerButton;
///
/// # async fn example() -> Result<(), rfb_remote::RfbClientError> {
/// let client = RfbClient::new(Config::default())?;
/// client.open("192.168.1.100", "5900")?;
///
/// while let Ok(event) = client.events().recv_async().await {
///     println!("{}", event);
///     if matches!(event, ServerEvent::Connected { .. }) {
///         client.mouse_event(PointerButton::Left, true, 10, 10).await?;
///         client.mouse_event(PointerButton::Left, false, 10, 10).await?;
///         break;
///     }
/// }
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RfbClient {
    inner: Arc<Inner>,
}

impl RfbClient {
    /// Create a client that spawns onto the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`RfbClientError::Config`] if the configuration is invalid,
    /// [`RfbClientError::Internal`] if called outside a tokio runtime.
    pub fn new(config: Config) -> Result<Self, RfbClientError> {
        let runtime = Handle::try_current()
            .map_err(|e| RfbClientError::Internal(format!("no tokio runtime: {}", e)))?;
        Self::with_runtime(config, runtime)
    }

    /// Create a client that spawns onto `runtime`.
    pub fn with_runtime(config: Config, runtime: Handle) -> Result<Self, RfbClientError> {
        config.validate()?;
        let (events, events_rx) = EventSink::bounded(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                runtime,
                events,
                events_rx,
                lifecycle: Mutex::new(Lifecycle::default()),
                session: tokio::sync::Mutex::new(None),
                close_signal: watch::channel(false).0,
            }),
        })
    }

    /// Validate `address` and `port` and start connecting.
    ///
    /// Returns without blocking; progress arrives on [`events`](Self::events).
    /// Ignored unless Disconnected.
    ///
    /// # Errors
    ///
    /// [`RfbClientError::AddressFormat`] if the text is invalid. No I/O is
    /// attempted and the client stays Disconnected.
    pub fn open(&self, address: &str, port: &str) -> Result<(), RfbClientError> {
        let mut lifecycle = self.inner.lifecycle.lock();
        if !lifecycle.connection.is_state(ConnectionState::Disconnected) {
            debug!("open ignored while {}", lifecycle.connection.state());
            return Ok(());
        }

        let target = match TargetAddress::parse(address, port) {
            Ok(target) => target,
            Err(e) => {
                warn!("{}", e);
                self.inner.events.emit(ServerEvent::error(e.to_string()));
                return Err(e);
            }
        };

        lifecycle
            .connection
            .transition_to(ConnectionState::Connecting)
            .map_err(|e| RfbClientError::Internal(e.to_string()))?;
        lifecycle.ready = false;
        lifecycle.frame_buffer = None;
        self.inner.close_signal.send_replace(false);

        self.inner
            .events
            .emit(ServerEvent::status(format!("Connecting to {}", target)));

        let inner = Arc::clone(&self.inner);
        lifecycle.worker = Some(self.inner.runtime.spawn(run_connection(inner, target)));
        Ok(())
    }

    /// Close the connection.
    ///
    /// Stops any handshake or pointer write in progress, then closes input,
    /// output, and the socket. Always ends Disconnected. A no-op unless
    /// Connected, and for every caller but the first when called concurrently.
    ///
    /// # Errors
    ///
    /// [`RfbClientError::CloseFailed`] if a close step failed.
    pub async fn close(&self) -> Result<(), RfbClientError> {
        let worker = {
            let mut lifecycle = self.inner.lifecycle.lock();
            if !lifecycle.connection.is_state(ConnectionState::Connected) || lifecycle.closing {
                debug!("close ignored while {}", lifecycle.connection.state());
                return Ok(());
            }
            lifecycle.closing = true;
            lifecycle.ready = false;
            self.inner.close_signal.send_replace(true);
            lifecycle.worker.take()
        };

        if let Some(worker) = worker {
            worker.abort();
            if let Err(e) = worker.await {
                if e.is_panic() {
                    warn!("connection task panicked: {}", e);
                }
            }
        }

        let session = self.inner.session.lock().await.take();
        let result = match session {
            Some(session) => session.close(),
            None => Ok(()),
        };

        {
            let mut lifecycle = self.inner.lifecycle.lock();
            lifecycle.connection.force_disconnected();
            lifecycle.closing = false;
            lifecycle.frame_buffer = None;
        }

        match &result {
            Ok(()) => self.inner.events.emit(ServerEvent::Disconnected),
            Err(e) => {
                warn!("{}", e);
                self.inner.events.emit(ServerEvent::error(e.to_string()));
            }
        }
        result
    }

    /// Press or release `button` at (`x`, `y`).
    ///
    /// The message carries every button currently held, not only `button`.
    ///
    /// # Errors
    ///
    /// [`RfbClientError::NotReady`] before the handshake is Ready, after
    /// close, or in view-only mode. [`RfbClientError::ConnectionClosed`] if
    /// `close` interrupted the write. [`RfbClientError::Transport`] if the
    /// write fails.
    pub async fn mouse_event(
        &self,
        button: PointerButton,
        down: bool,
        x: u16,
        y: u16,
    ) -> Result<(), RfbClientError> {
        if self.inner.config.input.view_only {
            return Err(RfbClientError::NotReady("view-only mode".to_string()));
        }

        // Subscribing under the lifecycle lock orders this call against close
        let closed = {
            let lifecycle = self.inner.lifecycle.lock();
            if !lifecycle.connection.is_state(ConnectionState::Connected) || !lifecycle.ready {
                return Err(RfbClientError::NotReady(
                    "connection is not ready for input".to_string(),
                ));
            }
            self.inner.close_signal.subscribe()
        };

        tokio::select! {
            biased;
            _ = wait_for_close(closed) => {
                debug!("pointer event abandoned by close");
                Err(RfbClientError::ConnectionClosed)
            }
            result = self.send_pointer(button, down, x, y) => result,
        }
    }

    async fn send_pointer(
        &self,
        button: PointerButton,
        down: bool,
        x: u16,
        y: u16,
    ) -> Result<(), RfbClientError> {
        let mut session = self.inner.session.lock().await;
        let session = session
            .as_mut()
            .ok_or_else(|| RfbClientError::NotReady("connection closed".to_string()))?;

        if let Err(e) = session.send_pointer(button, down, x, y).await {
            let message = format!("Error Sending RFB Pointer Event: {}", e);
            warn!("{}", message);
            self.inner.events.emit(ServerEvent::error(message));
            return Err(e);
        }
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lifecycle.lock().connection.state()
    }

    /// Whether the handshake reached Ready on the current connection.
    pub fn is_ready(&self) -> bool {
        let lifecycle = self.inner.lifecycle.lock();
        lifecycle.connection.is_state(ConnectionState::Connected) && lifecycle.ready
    }

    /// Geometry and name reported by the server, once Ready.
    pub fn frame_buffer(&self) -> Option<FrameBufferInfo> {
        self.inner.lifecycle.lock().frame_buffer.clone()
    }

    /// Receiver for status events.
    pub fn events(&self) -> flume::Receiver<ServerEvent> {
        self.inner.events_rx.clone()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

impl fmt::Debug for RfbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lifecycle = self.inner.lifecycle.lock();
        f.debug_struct("RfbClient")
            .field("state", &lifecycle.connection.state())
            .field("ready", &lifecycle.ready)
            .field("frame_buffer", &lifecycle.frame_buffer)
            .finish()
    }
}

/// Resolves once `close` has raised the signal.
async fn wait_for_close(mut closed: watch::Receiver<bool>) {
    loop {
        let raised = *closed.borrow_and_update();
        if raised || closed.changed().await.is_err() {
            return;
        }
    }
}

/// Background half of `open`: connect, then handshake.
async fn run_connection(inner: Arc<Inner>, target: TargetAddress) {
    let stream = match transport::connect_tcp(target, inner.config.timeout()).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("connect to {} failed: {}", target, e);
            {
                let mut lifecycle = inner.lifecycle.lock();
                lifecycle.connection.force_disconnected();
                lifecycle.worker = None;
            }
            inner.events.emit(ServerEvent::error(e.to_string()));
            return;
        }
    };

    let mut slot = inner.session.lock().await;
    let session = slot.insert(Session::new(
        stream,
        inner.config.connection.password.clone(),
    ));

    let moved = inner
        .lifecycle
        .lock()
        .connection
        .transition_to(ConnectionState::Connected);
    if let Err(e) = moved {
        warn!("{}", e);
        return;
    }
    inner
        .events
        .emit(ServerEvent::status(format!("Socket connected to {}", target)));

    match session.run_handshake(&inner.events).await {
        Ok(info) => {
            info!(
                "Connected to {}, {}x{}",
                info.server_name, info.width, info.height
            );
            {
                let mut lifecycle = inner.lifecycle.lock();
                lifecycle.ready = true;
                lifecycle.frame_buffer = Some(info.clone());
            }
            inner.events.emit(ServerEvent::Connected {
                width: info.width,
                height: info.height,
                name: info.server_name,
            });
        }
        Err(e) => {
            let err = RfbClientError::from(e);
            warn!("handshake with {} failed: {}", target, err);
            inner.events.emit(ServerEvent::error(err.to_string()));
        }
    }
}
