//! Use case: launch an application, by id or by name.
//!
//! Receivers are inconsistent about launching: some honour one channel
//! envelope and ignore the others, some only honour the REST endpoint, and
//! many never acknowledge anything.  A launch therefore runs in two phases:
//!
//! 1. **Channel.** If the connection is open, the configured launch variants
//!    are sent in order.  Emit-style variants wait briefly for an
//!    acknowledgement; without one the frame still counts as sent, and the
//!    next variant is tried in case this firmware expects another shape.  The
//!    phase ends at the first acknowledged variant or the first variant that
//!    is never acknowledged and was written successfully.
//! 2. **REST.** Always attempted, whatever phase 1 did.
//!
//! The launch succeeds if either phase did.  Per-method failures are logged at
//! `warn` and recorded in the returned [`LaunchReport`], never surfaced on
//! their own.

use std::sync::Arc;

use tracing::{debug, info, warn};
use tvremote_core::domain::apps::normalize;
use tvremote_core::{
    AttemptResult, CommandEnvelope, DeviceEvent, LaunchMethod, LaunchReport, LaunchVariant,
};

use crate::application::app_directory::{AppDirectory, Resolution};
use crate::application::command_channel::CommandChannel;
use crate::domain::RemoteError;
use crate::infrastructure::connection::Connection;
use crate::infrastructure::rest::RestLauncher;

/// Report of one id's launch plus the REST failure, if REST failed.
struct Outcome {
    report: LaunchReport,
    rest_error: Option<RemoteError>,
}

pub struct LaunchOrchestrator {
    channel: CommandChannel,
    directory: AppDirectory,
    rest: Arc<dyn RestLauncher>,
}

impl LaunchOrchestrator {
    pub fn new(connection: Arc<Connection>, rest: Arc<dyn RestLauncher>) -> Self {
        Self {
            channel: CommandChannel::new(Arc::clone(&connection)),
            directory: AppDirectory::new(connection),
            rest,
        }
    }

    /// Launches `app_id` over every available method.
    ///
    /// # Errors
    ///
    /// Only when every method failed: [`RemoteError::RestLaunchFailed`] with
    /// the REST status and body, or [`RemoteError::Transport`] if the REST
    /// request itself could not be made.
    pub async fn launch_by_id(&self, app_id: &str) -> Result<LaunchReport, RemoteError> {
        let outcome = self.attempt(app_id).await;
        if outcome.report.succeeded() {
            Ok(outcome.report)
        } else {
            Err(outcome
                .rest_error
                .unwrap_or_else(|| RemoteError::Transport(format!("launch of {app_id} failed"))))
        }
    }

    /// Resolves `name` and launches it.
    ///
    /// A live match is launched first.  If that fails, or the name only
    /// resolved through the static table, each static candidate is tried in
    /// order until one launches.
    ///
    /// # Errors
    ///
    /// [`RemoteError::AppNotFound`] if the name cannot be resolved or every
    /// candidate failed.  If a live match fails and the static table has no
    /// other candidates, that launch's own error is returned.
    pub async fn launch_by_name(&self, name: &str) -> Result<LaunchReport, RemoteError> {
        if normalize(name).is_empty() {
            return Err(RemoteError::AppNotFound(name.to_string()));
        }

        match self.directory.resolve_by_name(name).await? {
            Resolution::Live(app) => {
                info!(name, id = %app.id, "launching installed app");
                let first = self.attempt(&app.id).await;
                if first.report.succeeded() {
                    return Ok(first.report);
                }

                let rest: Vec<String> = self
                    .directory
                    .fallback_candidates(name)
                    .unwrap_or_default()
                    .iter()
                    .filter(|id| **id != app.id)
                    .cloned()
                    .collect();
                if rest.is_empty() {
                    return Err(first.rest_error.unwrap_or_else(|| {
                        RemoteError::Transport(format!("launch of {} failed", app.id))
                    }));
                }
                warn!(name, id = %app.id, "installed app did not launch; trying known ids");
                self.try_candidates(name, &rest, first.report).await
            }
            Resolution::Candidates(ids) => {
                info!(name, candidates = ids.len(), "launching from known ids");
                self.try_candidates(name, &ids, LaunchReport::new()).await
            }
        }
    }

    async fn try_candidates(
        &self,
        name: &str,
        ids: &[String],
        mut report: LaunchReport,
    ) -> Result<LaunchReport, RemoteError> {
        for id in ids {
            let outcome = self.attempt(id).await;
            let launched = outcome.report.succeeded();
            report.extend(outcome.report);
            if launched {
                info!(name, id = %id, "launched");
                return Ok(report);
            }
            debug!(name, id = %id, "candidate did not launch");
        }
        Err(RemoteError::AppNotFound(format!(
            "{} (none of {} candidate ids launched)",
            name.trim(),
            ids.len()
        )))
    }

    async fn attempt(&self, app_id: &str) -> Outcome {
        let mut report = LaunchReport::new();

        if self.channel.connection().is_open() {
            self.launch_over_channel(app_id, &mut report).await;
        } else {
            debug!(app_id, "channel not open; skipping channel launch");
        }

        let endpoint = self.channel.connection().endpoint();
        let rest_error = match self.rest.launch(endpoint, app_id).await {
            Ok(()) => {
                report.record(app_id, LaunchMethod::Rest, AttemptResult::Acknowledged);
                None
            }
            Err(e) => {
                warn!(app_id, "REST launch failed: {e}");
                report.record(app_id, LaunchMethod::Rest, AttemptResult::Failed(e.to_string()));
                Some(e)
            }
        };

        Outcome { report, rest_error }
    }

    /// Walks the configured variants until one is acknowledged, or one that
    /// is never acknowledged goes out.
    async fn launch_over_channel(&self, app_id: &str, report: &mut LaunchReport) {
        let config = self.channel.connection().config();
        for &variant in &config.launch_variants {
            let result = self.send_variant(variant, app_id).await;
            let done = match &result {
                AttemptResult::Acknowledged => true,
                AttemptResult::Sent if variant.awaits_ack() => {
                    debug!(app_id, %variant, "no acknowledgement; trying next variant");
                    false
                }
                AttemptResult::Sent => true,
                AttemptResult::Failed(reason) => {
                    warn!(app_id, %variant, "channel launch failed: {reason}");
                    false
                }
            };
            report.record(app_id, LaunchMethod::WebSocket(variant), result);
            if done {
                return;
            }
        }
    }

    async fn send_variant(&self, variant: LaunchVariant, app_id: &str) -> AttemptResult {
        let envelope = CommandEnvelope::launch(variant, app_id);
        if !variant.awaits_ack() {
            return match self.channel.send_command(&envelope).await {
                Ok(()) => AttemptResult::Sent,
                Err(e) => AttemptResult::Failed(e.to_string()),
            };
        }

        let ack = self
            .channel
            .subscribe(|e| matches!(e, DeviceEvent::AppLaunch { .. }));
        if let Err(e) = self.channel.send_command(&envelope).await {
            return AttemptResult::Failed(e.to_string());
        }
        let timeout = self.channel.connection().config().launch_ack_timeout;
        match ack.wait("launch acknowledgement", timeout).await {
            Ok(_) => AttemptResult::Acknowledged,
            Err(_) => AttemptResult::Sent,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
