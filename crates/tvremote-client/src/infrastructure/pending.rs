//! Outstanding request registry.
//!
//! # How replies are correlated (for beginners)
//!
//! The receiver answers requests on the same socket that carries unrelated
//! events, and frequently does not answer at all.  A caller that expects a
//! reply registers a *matcher* (a predicate over [`DeviceEvent`]) before
//! sending its request and receives a [`Subscription`].  The connection's
//! single reader task hands every inbound event to
//! [`PendingRequests::dispatch`], which gives the event to the **oldest**
//! registered matcher that accepts it.
//!
//! A subscription ends exactly once, on whichever comes first:
//!
//! - a matching event (the entry is removed by `dispatch`),
//! - its deadline (the entry is removed when the `Subscription` is dropped),
//! - the connection closing (`fail_all` drains every entry).
//!
//! Because removal is tied to `Drop`, a caller that is cancelled mid-await
//! never leaves a stale matcher behind.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::trace;
use tvremote_core::DeviceEvent;

use crate::domain::RemoteError;

type Matcher = Box<dyn Fn(&DeviceEvent) -> bool + Send + Sync>;

#[derive(Debug)]
enum Resolution {
    Matched(DeviceEvent),
    Closed,
}

struct Entry {
    id: u64,
    matcher: Matcher,
    resolver: oneshot::Sender<Resolution>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    // Registration order; dispatch scans from the front.
    entries: Vec<Entry>,
}

/// Registry of requests awaiting a reply on one connection.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct PendingRequests {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for PendingRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequests")
            .field("outstanding", &self.len())
            .finish()
    }
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `matcher` and returns the subscription that will receive the
    /// first event it accepts.
    pub fn register<F>(&self, matcher: F) -> Subscription
    where
        F: Fn(&DeviceEvent) -> bool + Send + Sync + 'static,
    {
        let (resolver, receiver) = oneshot::channel();
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            matcher: Box::new(matcher),
            resolver,
        });
        Subscription {
            id,
            receiver,
            registry: self.clone(),
        }
    }

    /// Offers `event` to the registered matchers, oldest first.
    ///
    /// Returns `true` if a subscription claimed it.
    pub fn dispatch(&self, event: &DeviceEvent) -> bool {
        let mut inner = self.lock();
        while let Some(pos) = inner.entries.iter().position(|e| (e.matcher)(event)) {
            let entry = inner.entries.remove(pos);
            if entry.resolver.send(Resolution::Matched(event.clone())).is_ok() {
                trace!(subscription = entry.id, kind = event.kind(), "event claimed");
                return true;
            }
            // The waiter is gone; let the next matcher have it.
        }
        false
    }

    /// Fails every outstanding subscription.  Called when the connection
    /// closes.
    pub fn fail_all(&self) {
        let drained: Vec<Entry> = std::mem::take(&mut self.lock().entries);
        for entry in drained {
            let _ = entry.resolver.send(Resolution::Closed);
        }
    }

    /// Number of outstanding subscriptions.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        self.lock().entries.retain(|e| e.id != id);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Matchers are plain predicates; a poisoned lock still holds
        // consistent data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One request awaiting its reply.  Dropping it withdraws the matcher.
pub struct Subscription {
    id: u64,
    receiver: oneshot::Receiver<Resolution>,
    registry: PendingRequests,
}

impl Subscription {
    /// Waits up to `after` for the matching event.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::Timeout`] if the deadline passes first.
    /// - [`RemoteError::Transport`] if the connection closes first.
    pub async fn wait(
        mut self,
        operation: &'static str,
        after: Duration,
    ) -> Result<DeviceEvent, RemoteError> {
        match tokio::time::timeout(after, &mut self.receiver).await {
            Ok(Ok(Resolution::Matched(event))) => Ok(event),
            Ok(Ok(Resolution::Closed)) | Ok(Err(_)) => Err(RemoteError::Transport(format!(
                "connection closed while waiting for {operation}"
            ))),
            Err(_) => Err(RemoteError::Timeout { operation, after }),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
