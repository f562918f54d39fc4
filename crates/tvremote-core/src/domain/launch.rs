//! Launch variants and the record of a launch attempt.
//!
//! Receivers accept "launch application X" in several structurally different
//! envelopes depending on firmware.  Nothing the receiver reports tells the
//! client which shape it understands, so the set of variants to try is an
//! ordered, configurable list rather than a fixed sequence.

use serde::{Deserialize, Serialize};

/// One envelope shape expressing "launch app `id`" over the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchVariant {
    /// `ms.channel.emit` / `ed.apps.launch` with `{appId}`.
    ChannelEmit,
    /// `ms.remote.control` with `Cmd=LaunchApp`.
    RemoteControl,
    /// `ed.apps.launch` with `action_type: NATIVE_LAUNCH`.
    NativeLaunch,
    /// `ed.apps.launch` with `action_type: DEEP_LINK` and an empty meta tag.
    DeepLink,
}

impl LaunchVariant {
    /// Every known variant, in the order they were introduced.
    pub const ALL: [LaunchVariant; 4] = [
        Self::ChannelEmit,
        Self::RemoteControl,
        Self::NativeLaunch,
        Self::DeepLink,
    ];

    /// The variants tried when nothing is configured.
    pub fn default_order() -> Vec<LaunchVariant> {
        vec![Self::ChannelEmit, Self::RemoteControl, Self::NativeLaunch]
    }

    /// Whether the receiver may answer this variant with an `ed.apps.launch`
    /// acknowledgement.  Remote-key launches are never acknowledged.
    pub fn awaits_ack(self) -> bool {
        !matches!(self, Self::RemoteControl)
    }

    /// Stable kebab-case name, identical to the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            Self::ChannelEmit => "channel-emit",
            Self::RemoteControl => "remote-control",
            Self::NativeLaunch => "native-launch",
            Self::DeepLink => "deep-link",
        }
    }
}

impl std::fmt::Display for LaunchVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for LaunchVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown launch variant '{s}'"))
    }
}

/// Which transport carried a launch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMethod {
    WebSocket(LaunchVariant),
    Rest,
}

impl std::fmt::Display for LaunchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WebSocket(variant) => write!(f, "ws:{variant}"),
            Self::Rest => f.write_str("rest"),
        }
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// The receiver explicitly acknowledged the launch (or REST returned 2xx).
    Acknowledged,
    /// The frame went out but no acknowledgement arrived in time.  Counts as
    /// success: many receivers never acknowledge.
    Sent,
    /// The attempt failed at the transport level or was rejected.
    Failed(String),
}

impl AttemptResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// One attempt made while launching an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchAttempt {
    pub app_id: String,
    pub method: LaunchMethod,
    pub result: AttemptResult,
}

/// Every attempt made by one launch request, in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    pub attempts: Vec<LaunchAttempt>,
}

impl LaunchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, app_id: &str, method: LaunchMethod, result: AttemptResult) {
        self.attempts.push(LaunchAttempt {
            app_id: app_id.to_string(),
            method,
            result,
        });
    }

    /// Appends the attempts of another report (used when several candidate
    /// ids are tried for one name).
    pub fn extend(&mut self, other: LaunchReport) {
        self.attempts.extend(other.attempts);
    }

    /// True if any attempt succeeded.
    pub fn succeeded(&self) -> bool {
        self.attempts.iter().any(|a| a.result.is_success())
    }

    /// The id of the first successful attempt.
    pub fn launched_id(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|a| a.result.is_success())
            .map(|a| a.app_id.as_str())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_excludes_deep_link() {
        let order = LaunchVariant::default_order();
        assert_eq!(
            order,
            vec![
                LaunchVariant::ChannelEmit,
                LaunchVariant::RemoteControl,
                LaunchVariant::NativeLaunch
            ]
        );
    }

    #[test]
    fn test_only_remote_control_skips_ack() {
        for variant in LaunchVariant::ALL {
            assert_eq!(variant.awaits_ack(), variant != LaunchVariant::RemoteControl);
        }
    }

    #[test]
    fn test_name_matches_serde_and_parses_back() {
        for variant in LaunchVariant::ALL {
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, format!("\"{}\"", variant.name()));
            assert_eq!(variant.name().parse::<LaunchVariant>().unwrap(), variant);
        }
    }

    #[test]
    fn test_unknown_variant_does_not_parse() {
        assert!("smoke-signal".parse::<LaunchVariant>().is_err());
    }

    #[test]
    fn test_report_succeeds_if_any_attempt_succeeded() {
        // Arrange
        let mut report = LaunchReport::new();
        report.record(
            "11101200001",
            LaunchMethod::WebSocket(LaunchVariant::ChannelEmit),
            AttemptResult::Failed("broken pipe".into()),
        );
        assert!(!report.succeeded());

        // Act
        report.record("3201907018807", LaunchMethod::Rest, AttemptResult::Acknowledged);

        // Assert
        assert!(report.succeeded());
        assert_eq!(report.launched_id(), Some("3201907018807"));
    }

    #[test]
    fn test_sent_counts_as_success() {
        assert!(AttemptResult::Sent.is_success());
        assert!(!AttemptResult::Failed(String::new()).is_success());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(
            LaunchMethod::WebSocket(LaunchVariant::NativeLaunch).to_string(),
            "ws:native-launch"
        );
        assert_eq!(LaunchMethod::Rest.to_string(), "rest");
    }
}
