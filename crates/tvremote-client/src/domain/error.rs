//! Error taxonomy of the remote-control client.
//!
//! Every public operation returns `Result<_, RemoteError>`.  The `Display`
//! text is the human-readable reason shown to the user, so variants carry the
//! detail needed to explain the failure (which operation timed out, what the
//! REST endpoint answered).

use std::time::Duration;

use thiserror::Error;
use tvremote_core::ProtocolError;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The operation needs an open channel and there is none.
    #[error("not connected to the receiver")]
    NotConnected,

    /// No correlated reply arrived within the deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Socket, TLS, or HTTP failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The name matched neither the live app list nor the fallback table, or
    /// every candidate failed to launch.
    #[error("application not found: {0}")]
    AppNotFound(String),

    /// The REST launch endpoint answered with a non-2xx status.
    #[error("REST launch failed with HTTP {status}: {body}")]
    RestLaunchFailed { status: u16, body: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RemoteError {
    /// Convenience constructor for transport failures from any displayable
    /// error.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RemoteError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
