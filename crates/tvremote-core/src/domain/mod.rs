//! Domain types shared by the protocol and the client: endpoints, apps, and
//! launch bookkeeping.  Nothing here performs I/O.

pub mod apps;
pub mod endpoint;
pub mod launch;

pub use apps::{find_match, AppDescriptor, KnownApps};
pub use endpoint::{encode_display_name, Endpoint, PortConfig, SecurityMode, DEFAULT_CHANNEL_NAME};
pub use launch::{AttemptResult, LaunchAttempt, LaunchMethod, LaunchReport, LaunchVariant};
