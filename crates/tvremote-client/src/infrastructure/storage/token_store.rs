//! Token persistence.
//!
//! A Secure-mode receiver issues a token once the user allows the client on
//! the TV.  Presenting that token on later connections skips the prompt, so
//! the connection hands every new or changed token to a [`TokenStore`], and
//! the registry asks the store for a token when it creates a Secure
//! connection.
//!
//! Persistence failures never fail a remote-control operation: the file store
//! logs them and carries on with its in-memory copy.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{config_dir, StorageError};

/// Collaborator that remembers tokens per receiver address.
pub trait TokenStore: Send + Sync {
    /// The stored token for `address`, if any.
    fn load(&self, address: &str) -> Option<String>;

    /// Records `token` for `address`, replacing any previous one.
    fn store(&self, address: &str, token: &str);

    /// Forgets the token for `address`.
    fn clear(&self, address: &str);
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// Volatile store, used by tests and when no file store is wanted.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one token.
    pub fn with_token(address: &str, token: &str) -> Self {
        let store = Self::new();
        store.store(address, token);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self, address: &str) -> Option<String> {
        self.tokens
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(address)
            .cloned()
    }

    fn store(&self, address: &str, token: &str) {
        self.tokens
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(address.to_string(), token.to_string());
    }

    fn clear(&self, address: &str) {
        self.tokens
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(address);
    }
}

// ── File store ────────────────────────────────────────────────────────────────

/// Tokens kept in a TOML table, one `"address" = "token"` pair per receiver:
///
/// ```toml
/// "192.168.1.20" = "18364925"
/// ```
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    tokens: Mutex<BTreeMap<String, String>>,
}

impl FileTokenStore {
    /// `tokens.toml` in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoPlatformConfigDir`] if the directory cannot be
    /// determined.
    pub fn default_path() -> Result<PathBuf, StorageError> {
        Ok(config_dir()?.join("tokens.toml"))
    }

    /// Opens the store at `path`.  A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] for read errors other than "not found",
    /// and [`StorageError::Parse`] for malformed TOML.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let tokens = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(Self {
            path,
            tokens: Mutex::new(tokens),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, tokens: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string(tokens)?;
        std::fs::write(&self.path, content).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) {
        let mut tokens = self.tokens.lock().unwrap_or_else(|p| p.into_inner());
        apply(&mut tokens);
        match self.save(&tokens) {
            Ok(()) => debug!(path = %self.path.display(), "token store saved"),
            Err(e) => warn!("failed to persist token store: {e}"),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, address: &str) -> Option<String> {
        self.tokens
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(address)
            .cloned()
    }

    fn store(&self, address: &str, token: &str) {
        self.update(|tokens| {
            tokens.insert(address.to_string(), token.to_string());
        });
    }

    fn clear(&self, address: &str) {
        self.update(|tokens| {
            tokens.remove(address);
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
