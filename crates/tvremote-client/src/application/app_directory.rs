//! Use case: turn a human-entered application name into launch ids.
//!
//! The live list from the receiver is preferred.  When the connection is not
//! open, the request fails, or nothing matches, the static table supplies an
//! ordered list of candidate ids for the launcher to try.

use std::sync::Arc;

use tracing::{debug, warn};
use tvremote_core::domain::apps::{find_match, normalize};
use tvremote_core::AppDescriptor;

use crate::application::command_channel::CommandChannel;
use crate::domain::RemoteError;
use crate::infrastructure::connection::Connection;

/// Result of resolving a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The receiver reported a matching installed application.
    Live(AppDescriptor),
    /// Candidate ids from the static table, in the order to try them.
    Candidates(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AppDirectory {
    channel: CommandChannel,
}

impl AppDirectory {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            channel: CommandChannel::new(connection),
        }
    }

    /// Resolves `query` (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// [`RemoteError::AppNotFound`] if neither the receiver nor the static
    /// table knows the name.  Failures of the live lookup are logged and
    /// fall through to the static table.
    pub async fn resolve_by_name(&self, query: &str) -> Result<Resolution, RemoteError> {
        if normalize(query).is_empty() {
            return Err(RemoteError::AppNotFound(query.to_string()));
        }

        if self.channel.connection().is_open() {
            match self.channel.list_apps().await {
                Ok(apps) => {
                    if let Some(app) = find_match(&apps, query) {
                        debug!(query, id = %app.id, name = %app.name, "resolved from receiver");
                        return Ok(Resolution::Live(app.clone()));
                    }
                    debug!(query, listed = apps.len(), "no installed app matches");
                }
                Err(e) => warn!(query, "installed-app lookup failed: {e}"),
            }
        }

        match self.fallback_candidates(query) {
            Some(ids) => {
                debug!(query, candidates = ids.len(), "resolved from static table");
                Ok(Resolution::Candidates(ids.to_vec()))
            }
            None => Err(RemoteError::AppNotFound(query.trim().to_string())),
        }
    }

    /// Static candidates for `query`, ignoring the receiver.
    pub fn fallback_candidates(&self, query: &str) -> Option<&[String]> {
        self.channel.connection().config().known_apps.candidates(query)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
