//! HTTP launch fallback.
//!
//! Some receivers ignore every launch envelope sent over the channel but honour
//! `POST /api/v2/applications/<id>` on the same port.  The launch orchestrator
//! always tries this path as well; it depends on the [`RestLauncher`] trait so
//! tests can substitute a mock.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use tvremote_core::domain::endpoint::Endpoint;

use crate::domain::RemoteError;

/// Launches an application through the receiver's REST API.
#[async_trait]
pub trait RestLauncher: Send + Sync {
    /// Posts a launch request for `app_id` to `endpoint`.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::RestLaunchFailed`] for a non-2xx status.
    /// - [`RemoteError::Transport`] if the request could not be made.
    async fn launch(&self, endpoint: &Endpoint, app_id: &str) -> Result<(), RemoteError>;
}

/// [`RestLauncher`] backed by `reqwest`.
///
/// Certificate validation is disabled: receivers serve HTTPS with a
/// self-signed certificate.
#[derive(Debug, Clone)]
pub struct HttpRestLauncher {
    client: reqwest::Client,
}

impl HttpRestLauncher {
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the HTTP client cannot be built
    /// (for example when no TLS backend is available).
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RestLauncher for HttpRestLauncher {
    async fn launch(&self, endpoint: &Endpoint, app_id: &str) -> Result<(), RemoteError> {
        let url = endpoint.launch_url(app_id)?;
        debug!(%url, "REST launch");

        let response = self
            .client
            .post(url)
            .json(&json!({ "action": "LAUNCH" }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::RestLaunchFailed {
            status: status.as_u16(),
            body,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
