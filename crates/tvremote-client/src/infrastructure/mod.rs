//! Infrastructure layer: sockets, HTTP, and the file system.
//!
//! - `connection` – one WebSocket to one receiver, with its reader task.
//! - `pending`    – reply correlation for requests in flight on a connection.
//! - `registry`   – one connection per receiver address.
//! - `rest`       – the HTTP launch fallback.
//! - `storage`    – token store and config file.

pub mod connection;
pub mod pending;
pub mod registry;
pub mod rest;
pub mod storage;

pub use connection::{Connection, ConnectionState};
pub use pending::{PendingRequests, Subscription};
pub use registry::ConnectionRegistry;
pub use rest::{HttpRestLauncher, RestLauncher};
