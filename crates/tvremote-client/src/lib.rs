//! tvremote-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does tvremote-client do? (for beginners)
//!
//! A networked TV receiver exposes a WebSocket "remote control" channel and a
//! small REST API on the local network.  This crate drives both:
//!
//! 1. Opens (at most) one WebSocket per receiver address, optionally over TLS.
//!    In secure mode the receiver pairs with us by sending a token, which is
//!    persisted and presented on later connections so the on-screen prompt
//!    does not reappear.
//! 2. Sends key presses and free text as JSON envelopes.
//! 3. Asks the receiver for its installed applications and matches the reply
//!    to the request.
//! 4. Launches applications by id or by name, trying several channel
//!    envelopes and then the REST endpoint, because receivers differ in which
//!    of these they honour.
//!
//! # Layers
//!
//! ```text
//! application/    CommandChannel, AppDirectory, LaunchOrchestrator
//!      │
//! infrastructure/ Connection (+ reader task), PendingRequests,
//!      │          ConnectionRegistry, HttpRestLauncher, storage/
//!      │
//! domain/         RemoteConfig, RemoteError
//! ```
//!
//! Envelope encoding, event classification, and endpoint URLs live in the
//! `tvremote-core` crate, which does no I/O.

/// Domain layer: configuration and the error type.
pub mod domain;

/// Application layer: use cases for a front-end.
pub mod application;

/// Infrastructure layer: sockets, HTTP, and files.
pub mod infrastructure;

pub use application::{AppDirectory, CommandChannel, LaunchOrchestrator, Resolution};
pub use domain::{RemoteConfig, RemoteError};
pub use infrastructure::{Connection, ConnectionRegistry, ConnectionState};
