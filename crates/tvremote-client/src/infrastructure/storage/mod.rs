//! Storage infrastructure: token persistence and the TOML config file.
//!
//! Both files live in the platform config directory:
//! - Windows:  `%APPDATA%\TvRemote\`
//! - Linux:    `~/.config/tvremote/`
//! - macOS:    `~/Library/Application Support/TvRemote/`
//!
//! The protocol core never touches the file system; it hands tokens to a
//! [`TokenStore`] and receives a ready-made `RemoteConfig`.

pub mod config_file;
pub mod token_store;

use std::path::PathBuf;

use thiserror::Error;

pub use config_file::AppConfigFile;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Error type for config and token file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Directory holding `config.toml` and `tokens.toml`.
///
/// # Errors
///
/// Returns [`StorageError::NoPlatformConfigDir`] when the base directory cannot
/// be derived from the environment.
pub fn config_dir() -> Result<PathBuf, StorageError> {
    platform_config_dir().ok_or(StorageError::NoPlatformConfigDir)
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TvRemote"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("TvRemote")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("tvremote"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
