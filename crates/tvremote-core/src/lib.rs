//! # tvremote-core
//!
//! Shared library for the TV remote-control client containing the JSON wire
//! codec, endpoint construction, the static app directory, and the launch
//! method catalogue.
//!
//! This crate is used by the async client crate (`tvremote-client`).
//! It has zero dependencies on sockets, async runtimes, or the file system.
//!
//! # Architecture overview (for beginners)
//!
//! A networked TV (the *receiver*) exposes a remote-control channel over a
//! WebSocket.  The client sends small JSON envelopes (`{method, params}`) to
//! press keys, type text, ask for the installed application list, or launch
//! an application.  The receiver answers with JSON *events* that are not
//! guaranteed to arrive at all, which is why the client crate correlates
//! replies with deadlines.
//!
//! This crate (`tvremote-core`) is the pure foundation.  It defines:
//!
//! - **`protocol`** – What the JSON on the wire looks like.  Outbound
//!   commands are built as typed envelopes and serialized; inbound frames are
//!   *classified* into [`DeviceEvent`]s and never cause an error, even when
//!   they are not JSON at all.
//!
//! - **`domain`** – Plain data and rules with no I/O: the two security modes
//!   and the URLs they produce, the app descriptor and the fallback table of
//!   well-known app identifiers, and the list of launch-envelope variants.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `tvremote_core::SecurityMode` instead of the full module path.
pub use domain::apps::{AppDescriptor, KnownApps};
pub use domain::endpoint::{PortConfig, SecurityMode};
pub use domain::launch::{AttemptResult, LaunchAttempt, LaunchMethod, LaunchReport, LaunchVariant};
pub use protocol::codec::{classify_message, encode_command, ProtocolError};
pub use protocol::messages::{CommandEnvelope, DeviceEvent, RawAppRecord};
