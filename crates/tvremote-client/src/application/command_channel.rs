//! Use case: send commands over an open connection and await their replies.
//!
//! Key presses and text are fire-and-forget: the receiver never acknowledges
//! them.  The installed-application list is a request/reply exchange built on
//! [`CommandChannel::send_correlated`], which registers the reply matcher
//! *before* sending so a fast reply cannot be missed, and withdraws it on
//! every exit path.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tvremote_core::protocol::CorrelationIds;
use tvremote_core::{AppDescriptor, CommandEnvelope, DeviceEvent};

use crate::domain::RemoteError;
use crate::infrastructure::connection::Connection;
use crate::infrastructure::pending::Subscription;

/// Command interface to one receiver.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    connection: Arc<Connection>,
}

impl CommandChannel {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Presses one remote key, e.g. `KEY_VOLUP`.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotConnected`] or [`RemoteError::Transport`].
    pub async fn send_key(&self, key: &str) -> Result<(), RemoteError> {
        self.send_command(&CommandEnvelope::key_click(key)).await
    }

    /// Types `text` into the focused on-screen field.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotConnected`] or [`RemoteError::Transport`].
    pub async fn send_text(&self, text: &str) -> Result<(), RemoteError> {
        self.send_command(&CommandEnvelope::text_input(text)).await
    }

    /// Sends one envelope without awaiting any reply.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotConnected`] without doing any I/O if the connection
    /// is not open, [`RemoteError::Transport`] if the write fails.
    pub async fn send_command(&self, envelope: &CommandEnvelope) -> Result<(), RemoteError> {
        if !self.connection.is_open() {
            return Err(RemoteError::NotConnected);
        }
        self.connection.send(envelope).await
    }

    /// Registers a reply matcher without sending anything.  Used by callers
    /// that treat a missing reply as something other than an error.
    pub fn subscribe<F>(&self, matcher: F) -> Subscription
    where
        F: Fn(&DeviceEvent) -> bool + Send + Sync + 'static,
    {
        self.connection.register(matcher)
    }

    /// Sends `envelope` and waits up to `timeout` for the first inbound event
    /// accepted by `matcher`.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::NotConnected`] if the connection is not open.
    /// - [`RemoteError::Timeout`] if no matching event arrives in time.
    /// - [`RemoteError::Transport`] if the write fails or the connection
    ///   closes while waiting.
    pub async fn send_correlated<F>(
        &self,
        envelope: &CommandEnvelope,
        matcher: F,
        operation: &'static str,
        timeout: Duration,
    ) -> Result<DeviceEvent, RemoteError>
    where
        F: Fn(&DeviceEvent) -> bool + Send + Sync + 'static,
    {
        if !self.connection.is_open() {
            return Err(RemoteError::NotConnected);
        }
        let reply = self.subscribe(matcher);
        self.connection.send(envelope).await?;
        reply.wait(operation, timeout).await
    }

    /// Asks the receiver for its installed applications.
    ///
    /// Records without a usable id are skipped.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotConnected`], [`RemoteError::Timeout`], or
    /// [`RemoteError::Transport`].
    pub async fn list_apps(&self) -> Result<Vec<AppDescriptor>, RemoteError> {
        let correlation_id = CorrelationIds::APPS.next();
        let timeout = self.connection.config().list_apps_timeout;
        let reply = self
            .send_correlated(
                &CommandEnvelope::installed_apps_request(&correlation_id),
                |e| matches!(e, DeviceEvent::InstalledApps { .. }),
                "listApps",
                timeout,
            )
            .await?;

        let DeviceEvent::InstalledApps { apps } = reply else {
            return Ok(Vec::new());
        };
        let descriptors: Vec<AppDescriptor> =
            apps.iter().filter_map(AppDescriptor::from_record).collect();
        debug!(
            address = self.connection.address(),
            %correlation_id,
            count = descriptors.len(),
            "installed apps received"
        );
        Ok(descriptors)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
