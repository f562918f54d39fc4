//! JSON envelope types for the receiver's remote-control channel.
//!
//! # Message flow
//!
//! ```text
//! Client   → Receiver:  CommandEnvelope  →  JSON text frame
//! Receiver → Client:    JSON text frame  →  DeviceEvent (classified, never an error)
//! ```
//!
//! # JSON discriminants
//!
//! Outbound frames are always an object with a `"method"` field naming the
//! channel operation and a `"params"` object whose shape depends on the
//! method:
//!
//! ```json
//! {"method":"ms.remote.control","params":{"Cmd":"Click","DataOfCmd":"KEY_HOME","Option":"false","TypeOfRemote":"SendRemoteKey"}}
//! {"method":"ms.channel.emit","params":{"event":"ed.apps.launch","to":"host","data":{"appId":"11101200001"}}}
//! ```
//!
//! Serde's `#[serde(tag = "method", content = "params")]` attribute produces
//! this adjacently-tagged layout automatically.
//!
//! Inbound frames are discriminated by their `"event"` field (or, for some
//! firmware, `"params.event"`).  Because the receiver emits many event types
//! the client does not care about, inbound frames are not deserialized into a
//! closed enum; the codec inspects the discriminator and falls back to
//! [`DeviceEvent::Other`] or [`DeviceEvent::Unrecognized`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::launch::LaunchVariant;

// ── Wire constants ────────────────────────────────────────────────────────────

/// `method` value for key presses, text input, and the remote-key launch form.
pub const METHOD_REMOTE_CONTROL: &str = "ms.remote.control";

/// `method` value for events emitted to the receiver host.
pub const METHOD_CHANNEL_EMIT: &str = "ms.channel.emit";

/// Inbound event that carries a freshly issued authentication token.
pub const EVENT_CHANNEL_CONNECT: &str = "ms.channel.connect";

/// Request and reply event for the installed-application list.
pub const EVENT_INSTALLED_APPS: &str = "ed.installedApp.get";

/// Request and acknowledgement event for launching an application.
pub const EVENT_APP_LAUNCH: &str = "ed.apps.launch";

/// Target of every `ms.channel.emit` request.
pub const EMIT_TARGET_HOST: &str = "host";

// ── Client → Receiver envelopes ───────────────────────────────────────────────

/// A complete outbound command: `{"method": ..., "params": {...}}`.
///
/// Build instances with the constructor functions ([`CommandEnvelope::key_click`],
/// [`CommandEnvelope::launch`], ...) rather than by hand so the exact field
/// spelling the receiver expects lives in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum CommandEnvelope {
    /// A remote-control command (`ms.remote.control`).
    #[serde(rename = "ms.remote.control")]
    RemoteControl(RemoteControlParams),

    /// An event emitted to the receiver host (`ms.channel.emit`).
    #[serde(rename = "ms.channel.emit")]
    ChannelEmit(ChannelEmitParams),
}

/// Parameters of an `ms.remote.control` command.
///
/// The receiver expects PascalCase keys (`Cmd`, `DataOfCmd`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteControlParams {
    /// Command verb: `Click`, `Type`, or `LaunchApp`.
    pub cmd: String,
    /// Command argument: a key name, free text, or an app identifier.
    pub data_of_cmd: String,
    /// Always "false" in practice.  Key and text commands send the *string*
    /// `"false"`; the launch form sends the JSON boolean `false`.
    pub option: Value,
    /// `SendRemoteKey` or `SendInputString`.
    pub type_of_remote: String,
}

/// Parameters of an `ms.channel.emit` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEmitParams {
    /// The event being emitted, e.g. `ed.apps.launch`.
    pub event: String,
    /// Recipient; always `host` for requests to the receiver itself.
    pub to: String,
    /// Event-specific payload.
    pub data: Value,
}

impl CommandEnvelope {
    /// A single remote key press (`Cmd=Click`), e.g. `KEY_VOLUP` or `KEY_HOME`.
    pub fn key_click(key: &str) -> Self {
        Self::RemoteControl(RemoteControlParams {
            cmd: "Click".to_string(),
            data_of_cmd: key.to_string(),
            option: Value::String("false".to_string()),
            type_of_remote: "SendRemoteKey".to_string(),
        })
    }

    /// Free text for the currently focused on-screen input field (`Cmd=Type`).
    pub fn text_input(text: &str) -> Self {
        Self::RemoteControl(RemoteControlParams {
            cmd: "Type".to_string(),
            data_of_cmd: text.to_string(),
            option: Value::String("false".to_string()),
            type_of_remote: "SendInputString".to_string(),
        })
    }

    /// Request for the installed-application list, tagged with `correlation_id`.
    pub fn installed_apps_request(correlation_id: &str) -> Self {
        Self::ChannelEmit(ChannelEmitParams {
            event: EVENT_INSTALLED_APPS.to_string(),
            to: EMIT_TARGET_HOST.to_string(),
            data: json!({ "id": correlation_id }),
        })
    }

    /// "Launch app `app_id`" expressed in the shape of `variant`.
    ///
    /// Receivers accept different shapes depending on firmware, so the launch
    /// orchestrator walks a list of variants and sends each in turn.
    pub fn launch(variant: LaunchVariant, app_id: &str) -> Self {
        match variant {
            LaunchVariant::ChannelEmit => Self::ChannelEmit(ChannelEmitParams {
                event: EVENT_APP_LAUNCH.to_string(),
                to: EMIT_TARGET_HOST.to_string(),
                data: json!({ "appId": app_id }),
            }),
            LaunchVariant::RemoteControl => Self::RemoteControl(RemoteControlParams {
                cmd: "LaunchApp".to_string(),
                data_of_cmd: app_id.to_string(),
                option: Value::Bool(false),
                type_of_remote: "SendRemoteKey".to_string(),
            }),
            LaunchVariant::NativeLaunch => Self::ChannelEmit(ChannelEmitParams {
                event: EVENT_APP_LAUNCH.to_string(),
                to: EMIT_TARGET_HOST.to_string(),
                data: json!({ "action_type": "NATIVE_LAUNCH", "appId": app_id }),
            }),
            LaunchVariant::DeepLink => Self::ChannelEmit(ChannelEmitParams {
                event: EVENT_APP_LAUNCH.to_string(),
                to: EMIT_TARGET_HOST.to_string(),
                data: json!({ "action_type": "DEEP_LINK", "appId": app_id, "metaTag": "" }),
            }),
        }
    }

    /// The `method` string this envelope serializes with.
    pub fn method(&self) -> &'static str {
        match self {
            Self::RemoteControl(_) => METHOD_REMOTE_CONTROL,
            Self::ChannelEmit(_) => METHOD_CHANNEL_EMIT,
        }
    }
}

// ── Receiver → Client events ──────────────────────────────────────────────────

/// A classified inbound frame.
///
/// Classification never fails: frames the client has no use for become
/// [`DeviceEvent::Other`] and frames that are not JSON objects become
/// [`DeviceEvent::Unrecognized`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// `ms.channel.connect`, sent once the channel is ready.  On the secure
    /// port, after the user approves the client on the TV, it carries a
    /// reusable token.
    ChannelConnect {
        /// The issued token, if the receiver included one.
        token: Option<String>,
    },

    /// Reply to an installed-application request.
    InstalledApps {
        /// Raw records exactly as the receiver reported them.
        apps: Vec<RawAppRecord>,
    },

    /// Acknowledgement of an application launch.
    AppLaunch {
        /// The complete frame, kept for diagnostics.
        body: Value,
    },

    /// Any other well-formed event; passed through and ignored by the core.
    Other {
        /// The `event` discriminator, when present.
        event: Option<String>,
        /// The complete frame.
        body: Value,
    },

    /// The frame was not a JSON object.
    Unrecognized {
        /// The frame text as received.
        raw: String,
    },
}

impl DeviceEvent {
    /// The event name this frame was classified under, for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::ChannelConnect { .. } => EVENT_CHANNEL_CONNECT,
            Self::InstalledApps { .. } => EVENT_INSTALLED_APPS,
            Self::AppLaunch { .. } => EVENT_APP_LAUNCH,
            Self::Other { event: Some(e), .. } => e,
            Self::Other { event: None, .. } => "<no event>",
            Self::Unrecognized { .. } => "<unrecognized>",
        }
    }
}

/// One application record from an `ed.installedApp.get` reply.
///
/// Firmware versions disagree on field names, so every field is optional.
/// [`RawAppRecord::launch_id`] and [`RawAppRecord::display_name`] apply the
/// preference order the client uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RawAppRecord {
    /// Launch identifier: `appId`, falling back to `id`.  Empty strings count
    /// as absent.
    pub fn launch_id(&self) -> Option<&str> {
        non_empty(&self.app_id).or_else(|| non_empty(&self.id))
    }

    /// Display name: `name`, then `appName`, then `title`, then `"Unknown"`.
    pub fn display_name(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.app_name))
            .or_else(|| non_empty(&self.title))
            .unwrap_or("Unknown")
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
