//! Scripted in-process receiver shared by the integration tests.
//!
//! An axum router on one `127.0.0.1:0` listener serves both the WebSocket
//! channel and the REST launch endpoint, like a real receiver.
//! [`FakeDevice::start`] speaks plain HTTP; [`FakeDevice::start_secure`] wraps
//! the same routes in TLS with a freshly generated self-signed certificate.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{OriginalUri, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::serve::Listener;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_native_tls::{TlsAcceptor, TlsStream};
use tvremote_client::domain::RemoteConfig;
use tvremote_client::infrastructure::storage::MemoryTokenStore;
use tvremote_client::ConnectionRegistry;
use tvremote_core::PortConfig;

// ── Script ────────────────────────────────────────────────────────────────────

/// How the fake receiver behaves.  Silent by default: no connect event, no
/// replies, and every REST launch answered with 404.
#[derive(Debug, Clone)]
pub struct Script {
    connect_event: bool,
    token: Option<String>,
    installed_apps: Option<Vec<(String, String)>>,
    ack_launch: bool,
    close_after_connect: bool,
    handshake_delay: Duration,
    rest_ok_ids: Vec<String>,
    rest_status: u16,
    rest_body: String,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connect_event: false,
            token: None,
            installed_apps: None,
            ack_launch: false,
            close_after_connect: false,
            handshake_delay: Duration::ZERO,
            rest_ok_ids: Vec::new(),
            rest_status: 404,
            rest_body: "Not Found".to_string(),
        }
    }
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `ms.channel.connect` right after the handshake.
    pub fn with_connect_event(mut self, token: Option<&str>) -> Self {
        self.connect_event = true;
        self.token = token.map(str::to_string);
        self
    }

    /// Answer `ed.installedApp.get` with these `(appId, name)` records.
    pub fn with_installed_apps(mut self, apps: &[(&str, &str)]) -> Self {
        self.installed_apps = Some(
            apps.iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        );
        self
    }

    /// Acknowledge every `ed.apps.launch` emit.
    pub fn with_launch_ack(mut self) -> Self {
        self.ack_launch = true;
        self
    }

    /// Send a close frame right after the connect event.
    pub fn closing_after_connect(mut self) -> Self {
        self.close_after_connect = true;
        self
    }

    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }

    /// Answer REST launches of `id` with 200.
    pub fn rest_accepts(mut self, id: &str) -> Self {
        self.rest_ok_ids.push(id.to_string());
        self
    }

    /// Status and body for REST launches not listed by `rest_accepts`.
    pub fn rest_rejects_with(mut self, status: u16, body: &str) -> Self {
        self.rest_status = status;
        self.rest_body = body.to_string();
        self
    }
}

// ── Recording ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RestCall {
    pub path: String,
    pub body: String,
}

#[derive(Default)]
struct Recorded {
    ws_accepts: AtomicUsize,
    ws_closed: AtomicUsize,
    uris: Mutex<Vec<String>>,
    frames: Mutex<Vec<Value>>,
    rest_calls: Mutex<Vec<RestCall>>,
}

struct DeviceState {
    script: Script,
    recorded: Arc<Recorded>,
}

// ── Device ────────────────────────────────────────────────────────────────────

pub struct FakeDevice {
    port: u16,
    recorded: Arc<Recorded>,
    task: JoinHandle<()>,
}

impl FakeDevice {
    /// Plain receiver: `ws://` channel and `http://` REST.
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener, script)
    }

    /// Secure receiver: `wss://` channel and `https://` REST behind a
    /// self-signed certificate.
    pub async fn start_secure(script: Script) -> Self {
        let listener = TlsListener::bind().await;
        Self::serve(listener, script)
    }

    fn serve<L>(listener: L, script: Script) -> Self
    where
        L: Listener<Addr = SocketAddr>,
    {
        let port = listener.local_addr().unwrap().port();
        let recorded = Arc::new(Recorded::default());
        let state = Arc::new(DeviceState {
            script,
            recorded: Arc::clone(&recorded),
        });
        let router = Router::new()
            .route("/api/v2/channels/{name}", get(open_channel))
            .route("/api/v2/applications/{id}", post(launch_app))
            .with_state(state);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            port,
            recorded,
            task,
        }
    }

    /// Client configuration pointing at this device, with short timeouts.
    pub fn config(&self) -> RemoteConfig {
        RemoteConfig {
            ports: PortConfig {
                plain: self.port,
                secure: self.port,
            },
            handshake_timeout: Duration::from_secs(2),
            token_grace_period: Duration::from_millis(200),
            list_apps_timeout: Duration::from_millis(300),
            launch_ack_timeout: Duration::from_millis(200),
            rest_timeout: Duration::from_secs(2),
            ..RemoteConfig::default()
        }
    }

    /// A registry over this device's configuration and an empty token store.
    pub fn registry(&self) -> ConnectionRegistry {
        ConnectionRegistry::new(Arc::new(self.config()), Arc::new(MemoryTokenStore::new()))
    }

    pub fn ws_accepts(&self) -> usize {
        self.recorded.ws_accepts.load(Ordering::SeqCst)
    }

    /// Channel sockets that have ended on the device side.
    pub fn ws_closed(&self) -> usize {
        self.recorded.ws_closed.load(Ordering::SeqCst)
    }

    /// Request URIs of every accepted WebSocket handshake.
    pub fn uris(&self) -> Vec<String> {
        self.recorded.uris.lock().unwrap().clone()
    }

    /// Every JSON frame received on any channel socket.
    pub fn frames(&self) -> Vec<Value> {
        self.recorded.frames.lock().unwrap().clone()
    }

    pub fn rest_calls(&self) -> Vec<RestCall> {
        self.recorded.rest_calls.lock().unwrap().clone()
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// ── TLS ───────────────────────────────────────────────────────────────────────

/// TCP listener that completes a TLS handshake before handing each socket
/// to axum.  Failed handshakes are dropped.
struct TlsListener {
    tcp: TcpListener,
    acceptor: TlsAcceptor,
}

impl TlsListener {
    async fn bind() -> Self {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let identity = native_tls::Identity::from_pkcs8(
            certified.cert.pem().as_bytes(),
            certified.signing_key.serialize_pem().as_bytes(),
        )
        .unwrap();
        let acceptor = native_tls::TlsAcceptor::new(identity).unwrap();
        Self {
            tcp: TcpListener::bind("127.0.0.1:0").await.unwrap(),
            acceptor: TlsAcceptor::from(acceptor),
        }
    }
}

impl Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            let Ok((stream, addr)) = self.tcp.accept().await else {
                continue;
            };
            if let Ok(tls) = self.acceptor.accept(stream).await {
                return (tls, addr);
            }
        }
    }

    fn local_addr(&self) -> std::io::Result<Self::Addr> {
        self.tcp.local_addr()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn open_channel(
    State(device): State<Arc<DeviceState>>,
    OriginalUri(uri): OriginalUri,
    ws: WebSocketUpgrade,
) -> Response {
    tokio::time::sleep(device.script.handshake_delay).await;
    device.recorded.uris.lock().unwrap().push(uri.to_string());
    device.recorded.ws_accepts.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| async move {
        run_channel(socket, &device).await;
        device.recorded.ws_closed.fetch_add(1, Ordering::SeqCst);
    })
}

async fn run_channel(socket: WebSocket, device: &DeviceState) {
    let script = &device.script;
    let (mut tx, mut rx) = socket.split();

    if script.connect_event {
        let data = match &script.token {
            Some(token) => json!({ "id": "client-1", "token": token }),
            None => json!({ "id": "client-1" }),
        };
        let event = json!({ "event": "ms.channel.connect", "data": data });
        if tx.send(Message::Text(event.to_string().into())).await.is_err() {
            return;
        }
    }
    if script.close_after_connect {
        let _ = tx.send(Message::Close(None)).await;
        return;
    }

    while let Some(Ok(message)) = rx.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        device.recorded.frames.lock().unwrap().push(frame.clone());

        let reply = match frame.pointer("/params/event").and_then(Value::as_str) {
            Some("ed.installedApp.get") => script.installed_apps.as_ref().map(|apps| {
                let records: Vec<Value> = apps
                    .iter()
                    .map(|(id, name)| json!({ "appId": id, "name": name, "app_type": 2 }))
                    .collect();
                json!({ "event": "ed.installedApp.get", "from": "host", "data": { "data": records } })
            }),
            Some("ed.apps.launch") if script.ack_launch => {
                Some(json!({ "event": "ed.apps.launch", "from": "host", "data": "200" }))
            }
            _ => None,
        };
        if let Some(reply) = reply {
            if tx.send(Message::Text(reply.to_string().into())).await.is_err() {
                break;
            }
        }
    }
}

async fn launch_app(
    State(device): State<Arc<DeviceState>>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    body: String,
) -> (StatusCode, String) {
    device.recorded.rest_calls.lock().unwrap().push(RestCall {
        path: uri.path().to_string(),
        body,
    });

    let script = &device.script;
    if script.rest_ok_ids.contains(&id) {
        (StatusCode::OK, String::new())
    } else {
        let status =
            StatusCode::from_u16(script.rest_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, script.rest_body.clone())
    }
}
