//! Security modes and the URLs they produce.
//!
//! A receiver exposes the same remote-control API on two ports:
//!
//! | Mode     | Channel scheme | REST scheme | Default port |
//! |----------|----------------|-------------|--------------|
//! | `Plain`  | `ws`           | `http`      | 8001         |
//! | `Secure` | `wss`          | `https`     | 8002         |
//!
//! Secure mode requires the user to approve the client on the TV once; the
//! receiver then issues a token that is passed back in the channel URL on
//! later connections.  Receivers use self-signed certificates, so the client
//! crate disables certificate validation for Secure mode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::protocol::codec::ProtocolError;

/// Name of the remote-control channel on the receiver.
pub const DEFAULT_CHANNEL_NAME: &str = "samsung.remote.control";

/// Which of the receiver's two ports (and trust policies) to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Unencrypted WebSocket / HTTP.  Never carries a token.
    #[default]
    Plain,
    /// TLS WebSocket / HTTPS with a receiver-issued token.
    Secure,
}

impl SecurityMode {
    /// `ws` or `wss`.
    pub fn channel_scheme(self) -> &'static str {
        match self {
            Self::Plain => "ws",
            Self::Secure => "wss",
        }
    }

    /// `http` or `https`.
    pub fn rest_scheme(self) -> &'static str {
        match self {
            Self::Plain => "http",
            Self::Secure => "https",
        }
    }

    pub fn is_secure(self) -> bool {
        matches!(self, Self::Secure)
    }
}

impl std::fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Secure => f.write_str("secure"),
        }
    }
}

/// Port numbers for each mode.  The WebSocket channel and the REST fallback of
/// a mode share one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub plain: u16,
    pub secure: u16,
}

impl PortConfig {
    /// The port for `mode`.
    pub fn port(&self, mode: SecurityMode) -> u16 {
        match mode {
            SecurityMode::Plain => self.plain,
            SecurityMode::Secure => self.secure,
        }
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            plain: 8001,
            secure: 8002,
        }
    }
}

/// Base64 (standard alphabet, padded) of the client's display name, as the
/// receiver expects in the `name` query parameter.
pub fn encode_display_name(display_name: &str) -> String {
    STANDARD.encode(display_name.as_bytes())
}

/// One receiver address in one security mode.
///
/// # Example
///
/// ```rust
/// use tvremote_core::domain::endpoint::{Endpoint, DEFAULT_CHANNEL_NAME};
/// use tvremote_core::{PortConfig, SecurityMode};
///
/// let ep = Endpoint::new("192.168.1.20", SecurityMode::Plain, PortConfig::default());
/// let url = ep.channel_url(DEFAULT_CHANNEL_NAME, "Rust Remote", None).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "ws://192.168.1.20:8001/api/v2/channels/samsung.remote.control?name=UnVzdCBSZW1vdGU%3D"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    address: String,
    mode: SecurityMode,
    ports: PortConfig,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, mode: SecurityMode, ports: PortConfig) -> Self {
        Self {
            address: address.into(),
            mode,
            ports,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    /// `scheme://address:port/api/v2/channels/<channel>?name=<b64>[&token=<token>]`.
    ///
    /// The token is only appended in Secure mode; a token handed to a Plain
    /// endpoint is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidUrl`] if the address is not a valid host.
    pub fn channel_url(
        &self,
        channel: &str,
        display_name: &str,
        token: Option<&str>,
    ) -> Result<Url, ProtocolError> {
        let mut url = self.base_url(self.mode.channel_scheme(), &["api", "v2", "channels", channel])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("name", &encode_display_name(display_name));
            if let (SecurityMode::Secure, Some(token)) = (self.mode, token) {
                query.append_pair("token", token);
            }
        }
        Ok(url)
    }

    /// `scheme://address:port/api/v2/applications/<url-encoded app id>`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidUrl`] if the address is not a valid host.
    pub fn launch_url(&self, app_id: &str) -> Result<Url, ProtocolError> {
        self.base_url(self.mode.rest_scheme(), &["api", "v2", "applications", app_id])
    }

    fn base_url(&self, scheme: &str, segments: &[&str]) -> Result<Url, ProtocolError> {
        let host = if self.address.contains(':') && !self.address.starts_with('[') {
            // Bare IPv6 literal.
            format!("[{}]", self.address)
        } else {
            self.address.clone()
        };
        let port = self.ports.port(self.mode);
        let mut url = Url::parse(&format!("{scheme}://{host}:{port}/"))
            .map_err(|e| ProtocolError::InvalidUrl(format!("{}: {e}", self.address)))?;
        url.path_segments_mut()
            .map_err(|()| ProtocolError::InvalidUrl(self.address.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(mode: SecurityMode) -> Endpoint {
        Endpoint::new("192.168.1.20", mode, PortConfig::default())
    }

    #[test]
    fn test_default_ports_are_8001_and_8002() {
        let ports = PortConfig::default();
        assert_eq!(ports.port(SecurityMode::Plain), 8001);
        assert_eq!(ports.port(SecurityMode::Secure), 8002);
    }

    #[test]
    fn test_display_name_is_standard_base64() {
        assert_eq!(encode_display_name("Rust Remote"), "UnVzdCBSZW1vdGU=");
        assert_eq!(encode_display_name("Living Room Remote"), "TGl2aW5nIFJvb20gUmVtb3Rl");
    }

    #[test]
    fn test_plain_channel_url() {
        // Arrange
        let ep = endpoint(SecurityMode::Plain);

        // Act
        let url = ep.channel_url(DEFAULT_CHANNEL_NAME, "Rust Remote", None).unwrap();

        // Assert
        assert_eq!(
            url.as_str(),
            "ws://192.168.1.20:8001/api/v2/channels/samsung.remote.control?name=UnVzdCBSZW1vdGU%3D"
        );
    }

    #[test]
    fn test_secure_channel_url_carries_token_verbatim() {
        // Arrange
        let ep = endpoint(SecurityMode::Secure);

        // Act
        let url = ep
            .channel_url(DEFAULT_CHANNEL_NAME, "Rust Remote", Some("18364925"))
            .unwrap();

        // Assert
        assert_eq!(
            url.as_str(),
            "wss://192.168.1.20:8002/api/v2/channels/samsung.remote.control?name=UnVzdCBSZW1vdGU%3D&token=18364925"
        );
    }

    #[test]
    fn test_secure_channel_url_without_token_has_no_token_param() {
        let url = endpoint(SecurityMode::Secure)
            .channel_url(DEFAULT_CHANNEL_NAME, "Rust Remote", None)
            .unwrap();
        assert!(!url.as_str().contains("token="));
    }

    #[test]
    fn test_plain_channel_url_ignores_token() {
        // A Plain-mode handshake must never leak a Secure-mode token.
        let url = endpoint(SecurityMode::Plain)
            .channel_url(DEFAULT_CHANNEL_NAME, "Rust Remote", Some("18364925"))
            .unwrap();
        assert!(!url.as_str().contains("18364925"));
    }

    #[test]
    fn test_launch_url_plain_and_secure() {
        assert_eq!(
            endpoint(SecurityMode::Plain).launch_url("11101200001").unwrap().as_str(),
            "http://192.168.1.20:8001/api/v2/applications/11101200001"
        );
        assert_eq!(
            endpoint(SecurityMode::Secure).launch_url("11101200001").unwrap().as_str(),
            "https://192.168.1.20:8002/api/v2/applications/11101200001"
        );
    }

    #[test]
    fn test_launch_url_encodes_app_id_segment() {
        let url = endpoint(SecurityMode::Plain).launch_url("my app/v2").unwrap();
        assert_eq!(
            url.as_str(),
            "http://192.168.1.20:8001/api/v2/applications/my%20app%2Fv2"
        );
    }

    #[test]
    fn test_custom_ports_are_used() {
        let ep = Endpoint::new(
            "tv.local",
            SecurityMode::Plain,
            PortConfig {
                plain: 18001,
                secure: 18002,
            },
        );
        let url = ep.launch_url("x").unwrap();
        assert_eq!(url.port(), Some(18001));
    }

    #[test]
    fn test_ipv6_address_is_bracketed() {
        let ep = Endpoint::new("fe80::1", SecurityMode::Plain, PortConfig::default());
        let url = ep.launch_url("x").unwrap();
        assert_eq!(url.as_str(), "http://[fe80::1]:8001/api/v2/applications/x");
    }

    #[test]
    fn test_invalid_address_is_an_error() {
        let ep = Endpoint::new("bad host name", SecurityMode::Plain, PortConfig::default());
        assert!(matches!(ep.launch_url("x"), Err(ProtocolError::InvalidUrl(_))));
    }

    #[test]
    fn test_security_mode_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&SecurityMode::Secure).unwrap(), r#""secure""#);
        let mode: SecurityMode = serde_json::from_str(r#""plain""#).unwrap();
        assert_eq!(mode, SecurityMode::Plain);
    }
}
