//! APNs response decoding and the error-reason taxonomy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::Deserialize;

/// Reason strings returned by APNs on failed pushes.
///
/// The set is closed as documented by Apple, but unknown reasons pass
/// through [`Response::reason`] as opaque strings.
pub mod reason {
    pub const PAYLOAD_EMPTY: &str = "PayloadEmpty";
    pub const PAYLOAD_TOO_LARGE: &str = "PayloadTooLarge";
    pub const BAD_TOPIC: &str = "BadTopic";
    pub const TOPIC_DISALLOWED: &str = "TopicDisallowed";
    pub const BAD_MESSAGE_ID: &str = "BadMessageId";
    pub const BAD_EXPIRATION_DATE: &str = "BadExpirationDate";
    pub const BAD_PRIORITY: &str = "BadPriority";
    pub const BAD_COLLAPSE_ID: &str = "BadCollapseId";
    pub const MISSING_DEVICE_TOKEN: &str = "MissingDeviceToken";
    pub const BAD_DEVICE_TOKEN: &str = "BadDeviceToken";
    pub const DEVICE_TOKEN_NOT_FOR_TOPIC: &str = "DeviceTokenNotForTopic";
    pub const UNREGISTERED: &str = "Unregistered";
    pub const DUPLICATE_HEADERS: &str = "DuplicateHeaders";
    pub const BAD_CERTIFICATE_ENVIRONMENT: &str = "BadCertificateEnvironment";
    pub const BAD_CERTIFICATE: &str = "BadCertificate";
    pub const FORBIDDEN: &str = "Forbidden";
    pub const BAD_PATH: &str = "BadPath";
    pub const METHOD_NOT_ALLOWED: &str = "MethodNotAllowed";
    pub const TOO_MANY_REQUESTS: &str = "TooManyRequests";
    pub const IDLE_TIMEOUT: &str = "IdleTimeout";
    pub const SHUTDOWN: &str = "Shutdown";
    pub const INTERNAL_SERVER_ERROR: &str = "InternalServerError";
    pub const SERVICE_UNAVAILABLE: &str = "ServiceUnavailable";
    pub const MISSING_TOPIC: &str = "MissingTopic";
    pub const MISSING_PROVIDER_TOKEN: &str = "MissingProviderToken";
    pub const INVALID_PROVIDER_TOKEN: &str = "InvalidProviderToken";
    pub const EXPIRED_PROVIDER_TOKEN: &str = "ExpiredProviderToken";
    pub const TOO_MANY_PROVIDER_TOKEN_UPDATES: &str = "TooManyProviderTokenUpdates";
}

/// The decoded outcome of a push.
///
/// `status_code` and `apns_id` come from the HTTP layer; `reason` and
/// `timestamp` only appear in failure bodies.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Response {
    /// HTTP status (200 on success).
    #[serde(skip)]
    pub status_code: u16,

    /// Canonical UUID from the `apns-id` response header.
    #[serde(skip)]
    pub apns_id: Option<String>,

    /// Failure reason from the response body; None on success.
    #[serde(default)]
    pub reason: Option<String>,

    /// For 410 Unregistered responses, the last instant APNs confirmed the
    /// token was valid for the topic. Sent by the server as integer
    /// milliseconds since the Unix epoch; anything else is a decode error.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Response {
    /// True when APNs accepted the notification (HTTP 200).
    pub fn sent(&self) -> bool {
        self.status_code == 200
    }
}

fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct MillisVisitor;

    impl<'de> Visitor<'de> for MillisVisitor {
        type Value = Option<DateTime<Utc>>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("milliseconds since the Unix epoch as a non-negative integer")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
            let millis =
                i64::try_from(value).map_err(|_| E::custom("millisecond timestamp out of range"))?;
            self.visit_i64(millis)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
            if value < 0 {
                return Err(E::custom("negative millisecond timestamp"));
            }
            DateTime::from_timestamp_millis(value)
                .map(Some)
                .ok_or_else(|| E::custom("millisecond timestamp out of range"))
        }
    }

    deserializer.deserialize_i64(MillisVisitor)
}
