//! One WebSocket connection to one receiver.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──ensure_open──▶ Connecting ──handshake ok──▶ Open
//!       ▲                            │                         │
//!       │                       handshake error           socket closed
//!     close()                        ▼                         ▼
//!       └──────────────────────── Closed ◀─────────────────────┘
//! ```
//!
//! `ensure_open` is idempotent and serialised by an async lock, so concurrent
//! callers share one handshake instead of opening duplicate sockets.  After
//! the socket opens, the call waits up to the configured grace period for the
//! receiver's `ms.channel.connect` event and then returns with whatever
//! token is known.  In Secure mode only a connect event that carries a token
//! ends the wait early.
//!
//! # Tasks
//!
//! The write half of the socket sits behind an `Arc<tokio::sync::Mutex>` so
//! commands go out in call order.  The read half is owned by a single reader
//! task that classifies every frame, captures tokens, and hands the event to
//! [`PendingRequests::dispatch`].  When the socket closes the reader moves the
//! connection to `Closed` and fails every outstanding request.
//!
//! Each socket is tagged with a generation number.  `close()` and every new
//! open attempt bump the generation, so a reader (or handshake) belonging to
//! an older socket can never overwrite the state of the current one.
//!
//! Token persistence can touch the file system, so the reader hands it to the
//! blocking pool instead of calling the store inline.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use tvremote_core::domain::endpoint::Endpoint;
use tvremote_core::{classify_message, encode_command, CommandEnvelope, DeviceEvent, SecurityMode};

use crate::domain::{RemoteConfig, RemoteError};
use crate::infrastructure::pending::{PendingRequests, Subscription};
use crate::infrastructure::storage::TokenStore;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a channel socket.
pub(crate) type FrameSink = Pin<Box<dyn Sink<WsMessage, Error = WsError> + Send>>;

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// State shared between the connection handle and its reader task.
struct Shared {
    address: String,
    mode: SecurityMode,
    state: watch::Sender<ConnectionState>,
    token: watch::Sender<Option<String>>,
    pending: PendingRequests,
    token_store: Arc<dyn TokenStore>,
    generation: AtomicU64,
}

impl Shared {
    fn handle_frame(&self, frame: &str) {
        let event = classify_message(frame);
        debug!(address = %self.address, kind = event.kind(), "inbound event");

        if let DeviceEvent::ChannelConnect { token: Some(token) } = &event {
            self.capture_token(token);
        }
        self.pending.dispatch(&event);
    }

    fn capture_token(&self, token: &str) {
        if self.mode != SecurityMode::Secure {
            debug!(address = %self.address, "ignoring token offered on plain channel");
            return;
        }
        let changed = self.token.send_if_modified(|current| {
            if current.as_deref() == Some(token) {
                false
            } else {
                *current = Some(token.to_string());
                true
            }
        });
        if changed {
            info!(address = %self.address, "receiver issued a new authentication token");
            self.persist_token(token.to_string());
        }
    }

    fn persist_token(&self, token: String) {
        let store = Arc::clone(&self.token_store);
        let address = self.address.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || store.store(&address, &token));
            }
            Err(_) => store.store(&address, &token),
        }
    }

    fn reader_finished(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        self.state.send_replace(ConnectionState::Closed);
        self.pending.fail_all();
    }
}

/// The live socket of one generation.
struct Link {
    writer: Arc<tokio::sync::Mutex<FrameSink>>,
    reader: JoinHandle<()>,
}

/// Owns at most one socket to one receiver address.
pub struct Connection {
    endpoint: Endpoint,
    config: Arc<RemoteConfig>,
    shared: Arc<Shared>,
    link: Mutex<Option<Link>>,
    open_lock: tokio::sync::Mutex<()>,
    retired: AtomicBool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.shared.address)
            .field("mode", &self.shared.mode)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    /// Creates a disconnected connection.  Nothing touches the network until
    /// [`Connection::ensure_open`].
    pub fn new(
        address: impl Into<String>,
        mode: SecurityMode,
        config: Arc<RemoteConfig>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        let address = address.into();
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (token, _) = watch::channel(None);
        Self {
            endpoint: Endpoint::new(address.clone(), mode, config.ports),
            config,
            shared: Arc::new(Shared {
                address,
                mode,
                state,
                token,
                pending: PendingRequests::new(),
                token_store,
                generation: AtomicU64::new(0),
            }),
            link: Mutex::new(None),
            open_lock: tokio::sync::Mutex::new(()),
            retired: AtomicBool::new(false),
        }
    }

    /// Seeds a previously stored token.  Ignored in Plain mode.
    pub fn with_token(self, token: Option<String>) -> Self {
        if self.shared.mode == SecurityMode::Secure {
            self.shared.token.send_replace(token);
        }
        self
    }

    pub fn address(&self) -> &str {
        &self.shared.address
    }

    pub fn mode(&self) -> SecurityMode {
        self.shared.mode
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// The current token.  Always `None` in Plain mode.
    pub fn token(&self) -> Option<String> {
        self.shared.token.borrow().clone()
    }

    /// True iff the state is `Open` and the socket's reader is still running.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
            && self
                .lock_link()
                .as_ref()
                .is_some_and(|link| !link.reader.is_finished())
    }

    /// Opens the socket if it is not already open and returns the token known
    /// afterwards.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::Transport`] if the handshake fails, times out, or the
    ///   socket closes during the grace period.  The state becomes `Closed`.
    /// - [`RemoteError::Transport`] without touching the network if the
    ///   connection was retired by [`Connection::retire`].
    /// - [`RemoteError::Protocol`] if the channel URL cannot be built.
    pub async fn ensure_open(&self) -> Result<Option<String>, RemoteError> {
        let _opening = self.open_lock.lock().await;
        if self.is_retired() {
            return Err(RemoteError::Transport(
                "connection was replaced and cannot be reopened".to_string(),
            ));
        }
        if self.is_open() {
            return Ok(self.token());
        }

        // Retire whatever is left of a previous socket.
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(stale) = self.lock_link().take() {
            stale.reader.abort();
        }
        self.shared.state.send_replace(ConnectionState::Connecting);

        let token = self.token();
        let url = match self.endpoint.channel_url(
            &self.config.channel_name,
            &self.config.display_name,
            token.as_deref(),
        ) {
            Ok(url) => url,
            Err(e) => return Err(self.fail_open(generation, e.into())),
        };
        info!(address = %self.shared.address, mode = %self.shared.mode, "opening channel");

        let connector = match tls_connector(self.shared.mode) {
            Ok(c) => c,
            Err(e) => return Err(self.fail_open(generation, e)),
        };
        let handshake = connect_async_tls_with_config(url.as_str(), None, false, connector);
        let ws = match tokio::time::timeout(self.config.handshake_timeout, handshake).await {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => return Err(self.fail_open(generation, e.into())),
            Err(_) => {
                let err = RemoteError::Transport(format!(
                    "handshake timed out after {:?}",
                    self.config.handshake_timeout
                ));
                return Err(self.fail_open(generation, err));
            }
        };

        let (sink, stream) = ws.split();
        let sink: FrameSink = Box::pin(sink);
        // Registered before the reader starts so the event cannot slip past.
        let needs_token = self.shared.mode == SecurityMode::Secure;
        let connected = self.shared.pending.register(move |e| match e {
            DeviceEvent::ChannelConnect { token } => !needs_token || token.is_some(),
            _ => false,
        });

        {
            let mut link = self.lock_link();
            if self.shared.generation.load(Ordering::SeqCst) != generation {
                return Err(RemoteError::Transport(
                    "connection closed while opening".to_string(),
                ));
            }
            let reader = tokio::spawn(read_loop(Arc::clone(&self.shared), stream, generation));
            *link = Some(Link {
                writer: Arc::new(tokio::sync::Mutex::new(sink)),
                reader,
            });
            self.shared.state.send_replace(ConnectionState::Open);
        }
        info!(address = %self.shared.address, "channel open");

        self.await_token(connected).await
    }

    async fn await_token(&self, connected: Subscription) -> Result<Option<String>, RemoteError> {
        match connected
            .wait("token grace period", self.config.token_grace_period)
            .await
        {
            Ok(_) => Ok(self.token()),
            Err(RemoteError::Timeout { .. }) if self.is_open() => {
                debug!(address = %self.shared.address, "no connect event within grace period");
                Ok(self.token())
            }
            Err(RemoteError::Timeout { .. }) => Err(RemoteError::Transport(
                "connection closed during grace period".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    fn fail_open(&self, generation: u64, err: RemoteError) -> RemoteError {
        warn!(address = %self.shared.address, "failed to open channel: {err}");
        if self.shared.generation.load(Ordering::SeqCst) == generation {
            self.shared.state.send_replace(ConnectionState::Closed);
        }
        err
    }

    /// Closes the socket, fails every pending request, and returns to
    /// `Disconnected`.  Idempotent.
    pub async fn close(&self) {
        if let Some(link) = self.detach() {
            link.reader.abort();
            close_sink(&self.shared.address, &link.writer).await;
            info!(address = %self.shared.address, "channel closed");
        }
    }

    /// Closes the connection for good, without waiting for the close
    /// handshake.  Later `ensure_open` calls fail.
    ///
    /// Callable outside async code.  Inside a runtime the close frame is
    /// sent from a background task; otherwise the socket is simply dropped.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
        let Some(link) = self.detach() else {
            return;
        };
        link.reader.abort();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let address = self.shared.address.clone();
            runtime.spawn(async move { close_sink(&address, &link.writer).await });
        }
        info!(address = %self.shared.address, "channel closed; connection retired");
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Moves to `Disconnected`, fails pending requests, and hands back the
    /// current socket, if any.
    fn detach(&self) -> Option<Link> {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        let link = {
            let mut guard = self.lock_link();
            self.shared.state.send_replace(ConnectionState::Disconnected);
            guard.take()
        };
        self.shared.pending.fail_all();
        link
    }

    /// Sends one command frame.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotConnected`] if the connection is not open,
    /// [`RemoteError::Transport`] if the write fails.
    pub async fn send(&self, envelope: &CommandEnvelope) -> Result<(), RemoteError> {
        let frame = encode_command(envelope)?;
        let writer = self.writer().ok_or(RemoteError::NotConnected)?;
        let mut sink = writer.lock().await;
        sink.send(WsMessage::Text(frame)).await?;
        debug!(address = %self.shared.address, method = envelope.method(), "command sent");
        Ok(())
    }

    /// Registers a reply matcher on this connection's inbound stream.
    pub fn register<F>(&self, matcher: F) -> Subscription
    where
        F: Fn(&DeviceEvent) -> bool + Send + Sync + 'static,
    {
        self.shared.pending.register(matcher)
    }

    /// Number of requests awaiting a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    fn writer(&self) -> Option<Arc<tokio::sync::Mutex<FrameSink>>> {
        if self.state() != ConnectionState::Open {
            return None;
        }
        self.lock_link()
            .as_ref()
            .filter(|link| !link.reader.is_finished())
            .map(|link| Arc::clone(&link.writer))
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Marks the connection open over `sink`, with a reader that never sees
    /// a frame.
    #[cfg(test)]
    pub(crate) fn attach_sink(&self, sink: FrameSink) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        let reader = tokio::spawn(std::future::pending::<()>());
        *self.lock_link() = Some(Link {
            writer: Arc::new(tokio::sync::Mutex::new(sink)),
            reader,
        });
        self.shared.state.send_replace(ConnectionState::Open);
    }
}

async fn close_sink(address: &str, writer: &tokio::sync::Mutex<FrameSink>) {
    let mut sink = writer.lock().await;
    if let Err(e) = sink.close().await {
        debug!(%address, "close handshake failed: {e}");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(link) = self.lock_link().take() {
            link.reader.abort();
        }
    }
}

// ── Reader task ───────────────────────────────────────────────────────────────

async fn read_loop(shared: Arc<Shared>, mut stream: SplitStream<WsStream>, generation: u64) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => shared.handle_frame(&text),
            Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => shared.handle_frame(&text),
                Err(_) => debug!(address = %shared.address, "ignoring non-UTF-8 binary frame"),
            },
            Ok(WsMessage::Close(frame)) => {
                debug!(address = %shared.address, ?frame, "receiver closed the channel");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(address = %shared.address, "channel read error: {e}");
                break;
            }
        }
    }
    shared.reader_finished(generation);
}

/// Secure mode trusts the receiver's self-signed certificate.
fn tls_connector(mode: SecurityMode) -> Result<Option<Connector>, RemoteError> {
    match mode {
        SecurityMode::Plain => Ok(None),
        SecurityMode::Secure => {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(RemoteError::transport)?;
            Ok(Some(Connector::NativeTls(tls)))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
