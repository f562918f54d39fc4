//! Correlation-id generation for request/reply matching.
//!
//! # What is a correlation id? (for beginners)
//!
//! The receiver answers requests asynchronously over the same socket that
//! carries unrelated events.  Tagging a request with a fresh, unique string
//! lets both sides (and anyone reading a packet capture) tell which reply
//! belongs to which request.
//!
//! Receivers do not reliably echo the id back, so the client crate matches
//! replies by event type; the id is still sent because some firmware requires
//! the `data.id` field to be present.
//!
//! # Thread safety
//!
//! Ids are built from a random v4 UUID, so two generators (or two threads
//! sharing one) never need to coordinate to stay unique.

use uuid::Uuid;

/// Produces unique ids of the form `<prefix>_<32 hex digits>`.
///
/// # Examples
///
/// ```rust
/// use tvremote_core::protocol::CorrelationIds;
///
/// let ids = CorrelationIds::new("apps");
/// let id = ids.next();
/// assert!(id.starts_with("apps_"));
/// assert_ne!(id, ids.next());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CorrelationIds {
    prefix: &'static str,
}

impl CorrelationIds {
    /// Prefix used for installed-application requests.
    pub const APPS: Self = Self::new("apps");

    /// Creates a generator whose ids start with `prefix_`.
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    /// Returns a fresh id.
    pub fn next(&self) -> String {
        format!("{}_{}", self.prefix, Uuid::new_v4().simple())
    }
}
