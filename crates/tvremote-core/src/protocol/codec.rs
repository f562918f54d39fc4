//! JSON codec for the remote-control channel.
//!
//! Two pure functions:
//!
//! - [`encode_command`] renders a [`CommandEnvelope`] as the text frame the
//!   receiver expects.
//! - [`classify_message`] turns an inbound text frame into a [`DeviceEvent`].
//!   It never fails.  Receivers emit plenty of frames the client does not
//!   understand, and some firmware sends non-JSON keepalives; those become
//!   [`DeviceEvent::Other`] / [`DeviceEvent::Unrecognized`] instead of errors.

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::protocol::messages::{
    CommandEnvelope, DeviceEvent, RawAppRecord, EVENT_APP_LAUNCH, EVENT_CHANNEL_CONNECT,
    EVENT_INSTALLED_APPS,
};

/// Errors produced while building outbound frames or endpoints.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The envelope could not be rendered as JSON.
    #[error("failed to serialize command envelope: {0}")]
    Serialize(String),

    /// An endpoint URL could not be constructed from the device address.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Serializes `envelope` into a JSON text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if serde rejects the value.  With the
/// envelope types in this crate that cannot happen in practice, but the error
/// is surfaced rather than unwrapped.
///
/// # Examples
///
/// ```rust
/// use tvremote_core::protocol::{encode_command, CommandEnvelope};
///
/// let frame = encode_command(&CommandEnvelope::key_click("KEY_HOME")).unwrap();
/// assert!(frame.starts_with(r#"{"method":"ms.remote.control""#));
/// ```
pub fn encode_command(envelope: &CommandEnvelope) -> Result<String, ProtocolError> {
    serde_json::to_string(envelope).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Classifies one inbound text frame.
///
/// The discriminator is the top-level `event` field, falling back to
/// `params.event` (some firmware wraps launch acknowledgements that way).
///
/// | Discriminator          | Result                                           |
/// |------------------------|--------------------------------------------------|
/// | `ms.channel.connect`   | [`DeviceEvent::ChannelConnect`] (`data.token`)   |
/// | `ed.installedApp.get`  | [`DeviceEvent::InstalledApps`] (`data.data`)     |
/// | `ed.apps.launch`       | [`DeviceEvent::AppLaunch`]                       |
/// | anything else          | [`DeviceEvent::Other`]                           |
/// | not a JSON object      | [`DeviceEvent::Unrecognized`]                    |
///
/// An `ed.installedApp.get` frame without a `data.data` array is not a usable
/// reply and is classified as `Other`.
///
/// # Examples
///
/// ```rust
/// use tvremote_core::protocol::{classify_message, DeviceEvent};
///
/// let event = classify_message(r#"{"event":"ms.channel.connect","data":{"token":"123"}}"#);
/// assert_eq!(event, DeviceEvent::ChannelConnect { token: Some("123".into()) });
///
/// assert!(matches!(classify_message("not json"), DeviceEvent::Unrecognized { .. }));
/// ```
pub fn classify_message(frame: &str) -> DeviceEvent {
    let body = match serde_json::from_str::<Value>(frame) {
        Ok(body @ Value::Object(_)) => body,
        _ => {
            trace!(len = frame.len(), "inbound frame is not a JSON object");
            return DeviceEvent::Unrecognized {
                raw: frame.to_string(),
            }
        }
    };

    let event = discriminator(&body).map(str::to_string);

    match event.as_deref() {
        Some(EVENT_CHANNEL_CONNECT) => DeviceEvent::ChannelConnect {
            token: body.pointer("/data/token").and_then(scalar_string),
        },
        Some(EVENT_INSTALLED_APPS) => match body.pointer("/data/data") {
            Some(Value::Array(records)) => DeviceEvent::InstalledApps {
                apps: records.iter().filter_map(parse_record).collect(),
            },
            _ => DeviceEvent::Other { event, body },
        },
        Some(EVENT_APP_LAUNCH) => DeviceEvent::AppLaunch { body },
        _ => DeviceEvent::Other { event, body },
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn discriminator(body: &Value) -> Option<&str> {
    body.get("event")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/params/event").and_then(Value::as_str))
}

/// Reads a string-ish JSON scalar.  Some firmware reports numeric ids and
/// tokens as JSON numbers.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_record(value: &Value) -> Option<RawAppRecord> {
    let obj = value.as_object()?;
    let field = |key: &str| obj.get(key).and_then(scalar_string);
    Some(RawAppRecord {
        app_id: field("appId"),
        id: field("id"),
        name: field("name"),
        app_name: field("appName"),
        title: field("title"),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::CommandEnvelope;

    #[test]
    fn test_encode_key_click_is_valid_json() {
        // Arrange
        let envelope = CommandEnvelope::key_click("KEY_POWER");

        // Act
        let frame = encode_command(&envelope).unwrap();

        // Assert: the frame parses back to the same envelope
        let decoded: CommandEnvelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_classify_token_event() {
        let event =
            classify_message(r#"{"event":"ms.channel.connect","data":{"id":"x","token":"55512345"}}"#);
        assert_eq!(
            event,
            DeviceEvent::ChannelConnect {
                token: Some("55512345".to_string())
            }
        );
    }

    #[test]
    fn test_classify_connect_without_token() {
        let event = classify_message(r#"{"event":"ms.channel.connect","data":{"clients":[]}}"#);
        assert_eq!(event, DeviceEvent::ChannelConnect { token: None });
    }

    #[test]
    fn test_classify_numeric_token_as_string() {
        let event = classify_message(r#"{"event":"ms.channel.connect","data":{"token":12345}}"#);
        assert_eq!(
            event,
            DeviceEvent::ChannelConnect {
                token: Some("12345".to_string())
            }
        );
    }

    #[test]
    fn test_classify_installed_apps_reply() {
        // Arrange: a reply with two records in different firmware dialects
        let frame = r#"{
            "event": "ed.installedApp.get",
            "from": "host",
            "data": {"data": [
                {"appId": "11101200001", "name": "Netflix", "app_type": 2},
                {"id": "111299001912", "title": "YouTube"}
            ]}
        }"#;

        // Act
        let event = classify_message(frame);

        // Assert
        let DeviceEvent::InstalledApps { apps } = event else {
            panic!("expected InstalledApps, got {event:?}");
        };
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].launch_id(), Some("11101200001"));
        assert_eq!(apps[1].launch_id(), Some("111299001912"));
        assert_eq!(apps[1].display_name(), "YouTube");
    }

    #[test]
    fn test_installed_apps_without_record_list_is_other() {
        let event = classify_message(r#"{"event":"ed.installedApp.get","data":{}}"#);
        assert!(matches!(event, DeviceEvent::Other { .. }));
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        let event = classify_message(
            r#"{"event":"ed.installedApp.get","data":{"data":["junk", {"appId":"1"}]}}"#,
        );
        let DeviceEvent::InstalledApps { apps } = event else {
            panic!("expected InstalledApps");
        };
        assert_eq!(apps.len(), 1);
    }

    #[test]
    fn test_classify_launch_ack_top_level() {
        let event = classify_message(r#"{"event":"ed.apps.launch","data":200}"#);
        assert!(matches!(event, DeviceEvent::AppLaunch { .. }));
    }

    #[test]
    fn test_classify_launch_ack_nested_in_params() {
        let event = classify_message(r#"{"method":"ms.channel.emit","params":{"event":"ed.apps.launch"}}"#);
        assert!(matches!(event, DeviceEvent::AppLaunch { .. }));
    }

    #[test]
    fn test_classify_unknown_event_is_other() {
        let event = classify_message(r#"{"event":"ms.channel.clientConnect","data":{}}"#);
        assert_eq!(event.kind(), "ms.channel.clientConnect");
    }

    #[test]
    fn test_classify_garbage_is_unrecognized() {
        // Arrange / Act
        let event = classify_message("\u{0}\u{1}not json at all");

        // Assert: malformed input must classify, never panic or error
        assert!(matches!(event, DeviceEvent::Unrecognized { .. }));
    }

    #[test]
    fn test_classify_json_array_is_unrecognized() {
        assert!(matches!(classify_message("[1,2,3]"), DeviceEvent::Unrecognized { .. }));
    }

    #[test]
    fn test_classify_empty_frame_is_unrecognized() {
        assert!(matches!(classify_message(""), DeviceEvent::Unrecognized { .. }));
    }
}
