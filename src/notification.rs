//! Request-level notification values.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{ApnsError, Result};
use crate::payload::Payload;

/// The coarse notification classification APNs requires since iOS 13.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PushType {
    #[default]
    Alert,
    Background,
    Voip,
    Complication,
    FileProvider,
    Mdm,
    Location,
    LiveActivity,
    PushToTalk,
}

impl PushType {
    /// Wire value for the `apns-push-type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Alert => "alert",
            PushType::Background => "background",
            PushType::Voip => "voip",
            PushType::Complication => "complication",
            PushType::FileProvider => "fileprovider",
            PushType::Mdm => "mdm",
            PushType::Location => "location",
            PushType::LiveActivity => "liveactivity",
            PushType::PushToTalk => "pushtotalk",
        }
    }
}

/// Delivery priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    /// Power-efficient delivery (5).
    Normal,
    /// Immediate delivery (10).
    High,
}

impl Priority {
    /// Wire value for the `apns-priority` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "5",
            Priority::High => "10",
        }
    }
}

/// Notification body: raw bytes, a pre-encoded string, or a JSON value
/// encoded at send time.
#[derive(Clone, Debug)]
pub enum NotificationPayload {
    /// Bytes passed through untouched.
    Data(Vec<u8>),
    /// A pre-encoded JSON string, sent as its UTF-8 bytes.
    Text(String),
    /// A value JSON-encoded when the request is built.
    Json(Value),
}

impl NotificationPayload {
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        match self {
            NotificationPayload::Data(data) => Ok(data.clone()),
            NotificationPayload::Text(text) => Ok(text.clone().into_bytes()),
            NotificationPayload::Json(value) => {
                serde_json::to_vec(value).map_err(|e| ApnsError::PayloadEncode(e.to_string()))
            }
        }
    }
}

impl Default for NotificationPayload {
    fn default() -> Self {
        NotificationPayload::Data(Vec::new())
    }
}

impl From<Payload> for NotificationPayload {
    fn from(payload: Payload) -> Self {
        NotificationPayload::Json(serde_json::to_value(payload).unwrap_or(Value::Null))
    }
}

impl From<Value> for NotificationPayload {
    fn from(value: Value) -> Self {
        NotificationPayload::Json(value)
    }
}

impl From<&str> for NotificationPayload {
    fn from(text: &str) -> Self {
        NotificationPayload::Text(text.to_string())
    }
}

impl From<String> for NotificationPayload {
    fn from(text: String) -> Self {
        NotificationPayload::Text(text)
    }
}

impl From<Vec<u8>> for NotificationPayload {
    fn from(data: Vec<u8>) -> Self {
        NotificationPayload::Data(data)
    }
}

impl From<&[u8]> for NotificationPayload {
    fn from(data: &[u8]) -> Self {
        NotificationPayload::Data(data.to_vec())
    }
}

/// A single push notification addressed to one device token.
///
/// Header fields map to `apns-*` request headers; only fields that are set
/// produce a header. `device_token` is required.
#[derive(Clone, Debug, Default)]
pub struct Notification {
    /// Canonical UUID for the notification; the server assigns one if empty.
    pub apns_id: Option<String>,
    /// Collapse identifier (64 bytes max, enforced server-side).
    pub collapse_id: Option<String>,
    /// Hex device token; required.
    pub device_token: String,
    /// Topic (reverse-DNS bundle id).
    pub topic: Option<String>,
    /// Absolute expiration instant, sent as Unix seconds. None omits the
    /// header and lets APNs store the notification only briefly.
    pub expiration: Option<DateTime<Utc>>,
    /// Delivery priority. None omits the header.
    pub priority: Option<Priority>,
    /// Push type; `alert` unless set.
    pub push_type: PushType,
    /// Thread id, sent as a `thread-id` header when set.
    pub thread_id: Option<String>,
    /// Notification body.
    pub payload: NotificationPayload,
}

impl Notification {
    /// Create a notification for a device token with the given payload.
    pub fn new(device_token: impl Into<String>, payload: impl Into<NotificationPayload>) -> Self {
        Self {
            device_token: device_token.into(),
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Encode the payload to the bytes that will form the request body.
    pub fn encode_payload(&self) -> Result<Vec<u8>> {
        self.payload.encode()
    }
}
