//! Domain layer: configuration and the error taxonomy.
//!
//! Nothing here performs I/O.  The wire-level domain types (endpoints, apps,
//! launch variants) live in `tvremote-core`.

pub mod config;
pub mod error;

pub use config::RemoteConfig;
pub use error::RemoteError;
