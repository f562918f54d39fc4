//! Process-wide map from receiver address to its connection.
//!
//! The registry is an explicit value owned by whoever drives the client (the
//! binary's `main`, or a test); there is no global state.  It guarantees at
//! most one [`Connection`] per address, so concurrent callers targeting the
//! same receiver share one socket.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};
use tvremote_core::SecurityMode;

use crate::domain::RemoteConfig;
use crate::infrastructure::connection::Connection;
use crate::infrastructure::storage::TokenStore;

/// Get-or-create registry of connections, keyed by address.
pub struct ConnectionRegistry {
    config: Arc<RemoteConfig>,
    token_store: Arc<dyn TokenStore>,
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new(config: Arc<RemoteConfig>, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            config,
            token_store,
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Arc<RemoteConfig> {
        &self.config
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    /// Returns the connection for `address`, creating it if needed.
    ///
    /// A new Secure connection is seeded with the token stored for the
    /// address.  Asking for a different mode than the registered connection
    /// replaces it, and the old connection is retired first: its socket
    /// closes and handles still pointing at it can no longer reopen it.
    pub fn get_or_create(&self, address: &str, mode: SecurityMode) -> Arc<Connection> {
        let mut connections = self.lock();
        if let Some(existing) = connections.get(address) {
            if existing.mode() == mode {
                return Arc::clone(existing);
            }
            info!(address, from = %existing.mode(), to = %mode, "replacing connection with new security mode");
            if let Some(old) = connections.remove(address) {
                old.retire();
            }
        }

        let token = match mode {
            SecurityMode::Secure => self.token_store.load(address),
            SecurityMode::Plain => None,
        };
        debug!(address, %mode, seeded = token.is_some(), "creating connection");
        let connection = Arc::new(
            Connection::new(address, mode, Arc::clone(&self.config), Arc::clone(&self.token_store))
                .with_token(token),
        );
        connections.insert(address.to_string(), Arc::clone(&connection));
        connection
    }

    /// The registered connection for `address`, if any.
    pub fn get(&self, address: &str) -> Option<Arc<Connection>> {
        self.lock().get(address).cloned()
    }

    /// Removes and closes the connection for `address`.
    pub async fn remove(&self, address: &str) {
        let removed = self.lock().remove(address);
        if let Some(connection) = removed {
            connection.close().await;
        }
    }

    /// Closes every connection.
    pub async fn close_all(&self) {
        let all: Vec<Arc<Connection>> = self.lock().drain().map(|(_, c)| c).collect();
        for connection in all {
            connection.close().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Connection>>> {
        self.connections.lock().unwrap_or_else(|p| p.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
