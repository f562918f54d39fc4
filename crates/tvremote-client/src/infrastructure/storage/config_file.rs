//! TOML config file for the `tvremote` binary.
//!
//! Every field is optional; a missing file or section behaves like the
//! defaults in [`RemoteConfig`].  Example:
//!
//! ```toml
//! [remote]
//! display_name = "Living Room Remote"
//! secure = true
//! log_level = "debug"
//! launch_variants = ["channel-emit", "remote-control", "native-launch", "deep-link"]
//!
//! [ports]
//! plain = 8001
//! secure = 8002
//!
//! [timeouts]
//! token_grace_ms = 1500
//! list_apps_ms = 6000
//!
//! [apps]
//! plex = ["3201512006963"]
//! ```
//!
//! Entries in `[apps]` are added to the built-in name → candidate-id table
//! and replace built-in entries with the same name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tvremote_core::{LaunchVariant, PortConfig};

use super::{config_dir, StorageError};
use crate::domain::RemoteConfig;

/// Top-level config file schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfigFile {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub ports: PortsSection,
    #[serde(default)]
    pub timeouts: TimeoutsSection,
    #[serde(default)]
    pub apps: BTreeMap<String, Vec<String>>,
}

/// General client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSection {
    #[serde(default = "default_display_name")]
    pub display_name: String,
    /// Use the secure port by default.
    #[serde(default)]
    pub secure: bool,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "LaunchVariant::default_order")]
    pub launch_variants: Vec<LaunchVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortsSection {
    #[serde(default = "default_plain_port")]
    pub plain: u16,
    #[serde(default = "default_secure_port")]
    pub secure: u16,
}

/// All timeouts in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutsSection {
    #[serde(default = "default_handshake_ms")]
    pub handshake_ms: u64,
    #[serde(default = "default_token_grace_ms")]
    pub token_grace_ms: u64,
    #[serde(default = "default_list_apps_ms")]
    pub list_apps_ms: u64,
    #[serde(default = "default_launch_ack_ms")]
    pub launch_ack_ms: u64,
    #[serde(default = "default_rest_ms")]
    pub rest_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_display_name() -> String {
    "Rust Remote".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_plain_port() -> u16 {
    8001
}
fn default_secure_port() -> u16 {
    8002
}
fn default_handshake_ms() -> u64 {
    7000
}
fn default_token_grace_ms() -> u64 {
    1200
}
fn default_list_apps_ms() -> u64 {
    4000
}
fn default_launch_ack_ms() -> u64 {
    3000
}
fn default_rest_ms() -> u64 {
    5000
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            secure: false,
            log_level: default_log_level(),
            launch_variants: LaunchVariant::default_order(),
        }
    }
}

impl Default for PortsSection {
    fn default() -> Self {
        Self {
            plain: default_plain_port(),
            secure: default_secure_port(),
        }
    }
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            handshake_ms: default_handshake_ms(),
            token_grace_ms: default_token_grace_ms(),
            list_apps_ms: default_list_apps_ms(),
            launch_ack_ms: default_launch_ack_ms(),
            rest_ms: default_rest_ms(),
        }
    }
}

// ── Loading and conversion ────────────────────────────────────────────────────

impl AppConfigFile {
    /// `config.toml` in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoPlatformConfigDir`] if the directory cannot be
    /// determined.
    pub fn default_path() -> Result<PathBuf, StorageError> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Loads the file at `path`, returning the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] for read errors other than "not found", and
    /// [`StorageError::Parse`] if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Builds the runtime configuration this file describes.
    pub fn to_remote_config(&self) -> RemoteConfig {
        let RemoteConfig {
            channel_name,
            known_apps,
            launch_variants: default_variants,
            ..
        } = RemoteConfig::default();
        let launch_variants = if self.remote.launch_variants.is_empty() {
            default_variants
        } else {
            self.remote.launch_variants.clone()
        };
        RemoteConfig {
            display_name: self.remote.display_name.clone(),
            ports: PortConfig {
                plain: self.ports.plain,
                secure: self.ports.secure,
            },
            handshake_timeout: Duration::from_millis(self.timeouts.handshake_ms),
            token_grace_period: Duration::from_millis(self.timeouts.token_grace_ms),
            list_apps_timeout: Duration::from_millis(self.timeouts.list_apps_ms),
            launch_ack_timeout: Duration::from_millis(self.timeouts.launch_ack_ms),
            rest_timeout: Duration::from_millis(self.timeouts.rest_ms),
            channel_name,
            launch_variants,
            known_apps: known_apps.with_overrides(self.apps.clone()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_matches_runtime_defaults() {
        // Arrange / Act
        let file: AppConfigFile = toml::from_str("").expect("empty TOML must parse");
        let cfg = file.to_remote_config();

        // Assert
        let defaults = RemoteConfig::default();
        assert_eq!(cfg.display_name, defaults.display_name);
        assert_eq!(cfg.ports, defaults.ports);
        assert_eq!(cfg.token_grace_period, defaults.token_grace_period);
        assert_eq!(cfg.list_apps_timeout, defaults.list_apps_timeout);
        assert_eq!(cfg.launch_variants, defaults.launch_variants);
        assert_eq!(cfg.known_apps, defaults.known_apps);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        // Arrange
        let toml_str = r#"
[remote]
display_name = "Living Room Remote"
launch_variants = ["deep-link", "channel-emit"]

[timeouts]
list_apps_ms = 6000
"#;

        // Act
        let cfg = toml::from_str::<AppConfigFile>(toml_str)
            .unwrap()
            .to_remote_config();

        // Assert
        assert_eq!(cfg.display_name, "Living Room Remote");
        assert_eq!(
            cfg.launch_variants,
            vec![LaunchVariant::DeepLink, LaunchVariant::ChannelEmit]
        );
        assert_eq!(cfg.list_apps_timeout, Duration::from_secs(6));
        assert_eq!(cfg.launch_ack_timeout, Duration::from_secs(3));
        assert_eq!(cfg.ports.secure, 8002);
    }

    #[test]
    fn test_apps_section_extends_known_apps() {
        let toml_str = r#"
[apps]
plex = ["3201512006963"]
Netflix = ["override-id"]
"#;
        let cfg = toml::from_str::<AppConfigFile>(toml_str)
            .unwrap()
            .to_remote_config();

        assert_eq!(cfg.known_apps.candidates("plex").unwrap(), ["3201512006963"]);
        assert_eq!(cfg.known_apps.candidates("netflix").unwrap(), ["override-id"]);
        assert!(cfg.known_apps.candidates("youtube").is_some());
    }

    #[test]
    fn test_unknown_launch_variant_is_a_parse_error() {
        let result = toml::from_str::<AppConfigFile>("[remote]\nlaunch_variants = [\"telepathy\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_variant_list_falls_back_to_default_order() {
        let cfg = toml::from_str::<AppConfigFile>("[remote]\nlaunch_variants = []\n")
            .unwrap()
            .to_remote_config();
        assert_eq!(cfg.launch_variants, LaunchVariant::default_order());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join(format!("tvremote_missing_{}.toml", uuid::Uuid::new_v4()));
        let file = AppConfigFile::load(&path).unwrap();
        assert_eq!(file, AppConfigFile::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut file = AppConfigFile::default();
        file.remote.secure = true;
        file.apps.insert("plex".into(), vec!["1".into()]);

        let text = toml::to_string_pretty(&file).unwrap();
        let restored: AppConfigFile = toml::from_str(&text).unwrap();

        assert_eq!(restored, file);
    }
}
