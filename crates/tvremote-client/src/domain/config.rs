//! Client configuration.
//!
//! [`RemoteConfig`] is the single source of truth for every timing and naming
//! constant the client uses.  It is built once at startup (from defaults, the
//! config file, and CLI flags) and shared as an `Arc<RemoteConfig>` by every
//! connection in the registry.
//!
//! Keeping it a plain struct with no environment or file reads lets tests
//! shrink the timeouts to milliseconds and point the ports at an in-process
//! fake receiver.

use std::time::Duration;

use tvremote_core::domain::endpoint::DEFAULT_CHANNEL_NAME;
use tvremote_core::{KnownApps, LaunchVariant, PortConfig};

/// All runtime configuration for the remote-control client.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tvremote_client::domain::RemoteConfig;
///
/// let cfg = RemoteConfig::default();
/// assert_eq!(cfg.ports.plain, 8001);
/// assert_eq!(cfg.list_apps_timeout, Duration::from_secs(4));
/// ```
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Name shown on the TV when it asks the user to allow this client.
    pub display_name: String,

    /// Ports for the plain and secure channels.  The REST launch fallback of a
    /// mode uses the same port as that mode's WebSocket channel.
    pub ports: PortConfig,

    /// Channel path segment, `samsung.remote.control` on every known receiver.
    pub channel_name: String,

    /// Upper bound on the WebSocket (and TLS) handshake.
    pub handshake_timeout: Duration,

    /// How long `ensure_open` waits after the socket opens for the receiver to
    /// issue a token before returning with whatever token is known.
    pub token_grace_period: Duration,

    /// Deadline for the installed-application reply.
    pub list_apps_timeout: Duration,

    /// Deadline for an `ed.apps.launch` acknowledgement, per variant.
    pub launch_ack_timeout: Duration,

    /// Total timeout of the REST launch request.
    pub rest_timeout: Duration,

    /// Launch envelopes tried over the channel, in order.
    pub launch_variants: Vec<LaunchVariant>,

    /// Name → candidate-id fallback table.
    pub known_apps: KnownApps,
}

impl Default for RemoteConfig {
    /// | Field              | Default                                   |
    /// |--------------------|-------------------------------------------|
    /// | display_name       | `Rust Remote`                             |
    /// | ports              | 8001 / 8002                               |
    /// | channel_name       | `samsung.remote.control`                  |
    /// | handshake_timeout  | 7 s                                       |
    /// | token_grace_period | 1.2 s                                     |
    /// | list_apps_timeout  | 4 s                                       |
    /// | launch_ack_timeout | 3 s                                       |
    /// | rest_timeout       | 5 s                                       |
    /// | launch_variants    | channel-emit, remote-control, native-launch |
    fn default() -> Self {
        Self {
            display_name: "Rust Remote".to_string(),
            ports: PortConfig::default(),
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            handshake_timeout: Duration::from_secs(7),
            token_grace_period: Duration::from_millis(1200),
            list_apps_timeout: Duration::from_secs(4),
            launch_ack_timeout: Duration::from_secs(3),
            rest_timeout: Duration::from_secs(5),
            launch_variants: LaunchVariant::default_order(),
            known_apps: KnownApps::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
