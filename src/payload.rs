//! Fluent builder for the APNs `aps` payload dictionary.
//!
//! [`Payload`] materialises the JSON document APNs expects: an `aps`
//! dictionary plus arbitrary custom top-level keys. `aps` keys serialize in
//! Apple's canonical (alphabetical) order; custom keys follow `aps`,
//! alphabetical among themselves.

use serde::ser::Serializer;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApnsError, Result};

/// The `alert` entry: either a bare string or a structured dictionary.
///
/// A sub-field setter on the builder promotes a string alert to a
/// dictionary alert silently, dropping the prior string.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Alert {
    /// `"alert": "<text>"`
    Body(String),
    /// `"alert": { ... }`
    Dictionary(Box<AlertDictionary>),
}

impl From<&str> for Alert {
    fn from(body: &str) -> Self {
        Alert::Body(body.to_string())
    }
}

impl From<String> for Alert {
    fn from(body: String) -> Self {
        Alert::Body(body)
    }
}

impl From<AlertDictionary> for Alert {
    fn from(dictionary: AlertDictionary) -> Self {
        Alert::Dictionary(Box::new(dictionary))
    }
}

/// Structured alert fields.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AlertDictionary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(rename = "action-loc-key", skip_serializing_if = "Option::is_none")]
    pub action_loc_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "launch-image", skip_serializing_if = "Option::is_none")]
    pub launch_image: Option<String>,
    #[serde(rename = "loc-args", skip_serializing_if = "Option::is_none")]
    pub loc_args: Option<Vec<String>>,
    #[serde(rename = "loc-key", skip_serializing_if = "Option::is_none")]
    pub loc_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(rename = "summary-arg", skip_serializing_if = "Option::is_none")]
    pub summary_arg: Option<String>,
    #[serde(rename = "summary-arg-count", skip_serializing_if = "Option::is_none")]
    pub summary_arg_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "title-loc-args", skip_serializing_if = "Option::is_none")]
    pub title_loc_args: Option<Vec<String>>,
    #[serde(rename = "title-loc-key", skip_serializing_if = "Option::is_none")]
    pub title_loc_key: Option<String>,
}

/// The `sound` entry: a sound name or a critical-sound dictionary.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Sound {
    /// `"sound": "<name>"`
    Name(String),
    /// `"sound": {"critical": .., "name": .., "volume": ..}`
    Dictionary(CriticalSound),
}

impl From<&str> for Sound {
    fn from(name: &str) -> Self {
        Sound::Name(name.to_string())
    }
}

impl From<String> for Sound {
    fn from(name: String) -> Self {
        Sound::Name(name)
    }
}

impl From<CriticalSound> for Sound {
    fn from(dictionary: CriticalSound) -> Self {
        Sound::Dictionary(dictionary)
    }
}

/// Critical-alert sound dictionary.
#[derive(Clone, Debug, Serialize)]
pub struct CriticalSound {
    pub critical: u8,
    pub name: String,
    #[serde(serialize_with = "serialize_number")]
    pub volume: f64,
}

/// Interruption level for the notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterruptionLevel {
    Passive,
    Active,
    TimeSensitive,
    Critical,
}

#[derive(Clone, Debug, Default, Serialize)]
struct Aps {
    #[serde(skip_serializing_if = "Option::is_none")]
    alert: Option<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    content_available: Option<u8>,
    #[serde(rename = "interruption-level", skip_serializing_if = "Option::is_none")]
    interruption_level: Option<InterruptionLevel>,
    #[serde(rename = "mutable-content", skip_serializing_if = "Option::is_none")]
    mutable_content: Option<u8>,
    #[serde(
        rename = "relevance-score",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    relevance_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<Sound>,
    #[serde(rename = "thread-id", skip_serializing_if = "Option::is_none")]
    thread_id: Option<String>,
    #[serde(rename = "url-args", skip_serializing_if = "Option::is_none")]
    url_args: Option<Vec<String>>,
}

/// Chainable APNs payload builder.
///
/// ```
/// use apns_client::payload::Payload;
///
/// let payload = Payload::new()
///     .alert_title("Hello")
///     .alert_body("World")
///     .badge(1)
///     .sound_name("chime.caf");
/// ```
#[derive(Clone, Debug, Default, Serialize)]
pub struct Payload {
    aps: Aps,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

impl Payload {
    /// Create an empty payload (`{"aps":{}}`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alert to a bare string or a full dictionary.
    pub fn alert(mut self, alert: impl Into<Alert>) -> Self {
        self.aps.alert = Some(alert.into());
        self
    }

    /// Set the alert title.
    pub fn alert_title(mut self, title: impl Into<String>) -> Self {
        self.alert_dictionary().title = Some(title.into());
        self
    }

    /// Set the alert subtitle.
    pub fn alert_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.alert_dictionary().subtitle = Some(subtitle.into());
        self
    }

    /// Set the alert body text.
    pub fn alert_body(mut self, body: impl Into<String>) -> Self {
        self.alert_dictionary().body = Some(body.into());
        self
    }

    /// Set the launch image shown when the notification is tapped.
    pub fn alert_launch_image(mut self, image: impl Into<String>) -> Self {
        self.alert_dictionary().launch_image = Some(image.into());
        self
    }

    /// Set the localization key for the alert message.
    pub fn alert_loc_key(mut self, key: impl Into<String>) -> Self {
        self.alert_dictionary().loc_key = Some(key.into());
        self
    }

    /// Set the localization arguments for the alert message.
    pub fn alert_loc_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.alert_dictionary().loc_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Set the localization key for the alert title.
    pub fn alert_title_loc_key(mut self, key: impl Into<String>) -> Self {
        self.alert_dictionary().title_loc_key = Some(key.into());
        self
    }

    /// Set the localization arguments for the alert title.
    pub fn alert_title_loc_args(
        mut self,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.alert_dictionary().title_loc_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Set the alert action.
    pub fn alert_action(mut self, action: impl Into<String>) -> Self {
        self.alert_dictionary().action = Some(action.into());
        self
    }

    /// Set the localization key for the action button.
    pub fn alert_action_loc_key(mut self, key: impl Into<String>) -> Self {
        self.alert_dictionary().action_loc_key = Some(key.into());
        self
    }

    /// Set the summary argument for grouped notifications.
    pub fn alert_summary_arg(mut self, arg: impl Into<String>) -> Self {
        self.alert_dictionary().summary_arg = Some(arg.into());
        self
    }

    /// Set the summary argument count for grouped notifications.
    pub fn alert_summary_arg_count(mut self, count: u32) -> Self {
        self.alert_dictionary().summary_arg_count = Some(count);
        self
    }

    /// Set the badge count.
    pub fn badge(mut self, count: u32) -> Self {
        self.aps.badge = Some(count);
        self
    }

    /// Set the badge to zero, clearing it on the device.
    pub fn zero_badge(self) -> Self {
        self.badge(0)
    }

    /// Remove the badge key entirely, leaving the device badge untouched.
    pub fn unset_badge(mut self) -> Self {
        self.aps.badge = None;
        self
    }

    /// Set the sound to a name or a critical-sound dictionary.
    pub fn sound(mut self, sound: impl Into<Sound>) -> Self {
        self.aps.sound = Some(sound.into());
        self
    }

    /// Set a critical sound by name at full volume.
    ///
    /// Replaces any previous sound value.
    pub fn sound_name(mut self, name: impl Into<String>) -> Self {
        self.aps.sound = Some(Sound::Dictionary(CriticalSound {
            critical: 1,
            name: name.into(),
            volume: 1.0,
        }));
        self
    }

    /// Set the default critical sound at the given volume (0.0 to 1.0).
    ///
    /// Replaces any previous sound value.
    pub fn sound_volume(mut self, volume: f64) -> Self {
        self.aps.sound = Some(Sound::Dictionary(CriticalSound {
            critical: 1,
            name: "default".to_string(),
            volume,
        }));
        self
    }

    /// Mark the notification as content-available (background refresh).
    pub fn content_available(mut self) -> Self {
        self.aps.content_available = Some(1);
        self
    }

    /// Mark the notification as mutable by a service extension.
    pub fn mutable_content(mut self) -> Self {
        self.aps.mutable_content = Some(1);
        self
    }

    /// Set the notification category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.aps.category = Some(category.into());
        self
    }

    /// Set the thread id used for notification grouping on the device.
    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.aps.thread_id = Some(thread_id.into());
        self
    }

    /// Set the URL arguments for Safari push notifications.
    pub fn url_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aps.url_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Set the interruption level.
    pub fn interruption_level(mut self, level: InterruptionLevel) -> Self {
        self.aps.interruption_level = Some(level);
        self
    }

    /// Set the relevance score (0.0 to 1.0). Zero is emitted, not elided.
    pub fn relevance_score(mut self, score: f64) -> Self {
        self.aps.relevance_score = Some(score);
        self
    }

    /// Remove the relevance-score key entirely.
    pub fn unset_relevance_score(mut self) -> Self {
        self.aps.relevance_score = None;
        self
    }

    /// Set the top-level `mdm` key (outside `aps`).
    pub fn mdm(self, push_magic: impl Into<String>) -> Self {
        self.custom("mdm", Value::String(push_magic.into()))
    }

    /// Set an arbitrary custom top-level key.
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Serialize the payload to its JSON string form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ApnsError::PayloadEncode(e.to_string()))
    }

    fn alert_dictionary(&mut self) -> &mut AlertDictionary {
        if !matches!(self.aps.alert, Some(Alert::Dictionary(_))) {
            self.aps.alert = Some(Alert::Dictionary(Box::default()));
        }
        let Some(Alert::Dictionary(dictionary)) = self.aps.alert.as_mut() else {
            unreachable!()
        };
        dictionary
    }
}

/// Serialize whole numbers as integers so the wire form matches Apple's
/// documented examples (`"volume":1`, not `"volume":1.0`).
fn serialize_number<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract() == 0.0 && *value >= 0.0 && *value <= u64::MAX as f64 {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn serialize_opt_number<S>(value: &Option<f64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(value) => serialize_number(value, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(payload: &Payload) -> String {
        serde_json::to_string(payload).unwrap()
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(json(&Payload::new()), r#"{"aps":{}}"#);
    }

    #[test]
    fn test_alert() {
        let payload = Payload::new().alert("hello");
        assert_eq!(json(&payload), r#"{"aps":{"alert":"hello"}}"#);
    }

    #[test]
    fn test_badge() {
        let payload = Payload::new().badge(1);
        assert_eq!(json(&payload), r#"{"aps":{"badge":1}}"#);
    }

    #[test]
    fn test_zero_badge() {
        let payload = Payload::new().zero_badge();
        assert_eq!(json(&payload), r#"{"aps":{"badge":0}}"#);
    }

    #[test]
    fn test_unset_badge() {
        let payload = Payload::new().badge(1).unset_badge();
        assert_eq!(json(&payload), r#"{"aps":{}}"#);
    }

    #[test]
    fn test_sound() {
        let payload = Payload::new().sound("Default.caf");
        assert_eq!(json(&payload), r#"{"aps":{"sound":"Default.caf"}}"#);
    }

    #[test]
    fn test_sound_dictionary() {
        let payload = Payload::new().sound(CriticalSound {
            critical: 1,
            name: "default".to_string(),
            volume: 0.8,
        });
        assert_eq!(
            json(&payload),
            r#"{"aps":{"sound":{"critical":1,"name":"default","volume":0.8}}}"#
        );
    }

    #[test]
    fn test_sound_name() {
        let payload = Payload::new().sound_name("test");
        assert_eq!(
            json(&payload),
            r#"{"aps":{"sound":{"critical":1,"name":"test","volume":1}}}"#
        );
    }

    #[test]
    fn test_sound_volume() {
        let payload = Payload::new().sound_volume(0.5);
        assert_eq!(
            json(&payload),
            r#"{"aps":{"sound":{"critical":1,"name":"default","volume":0.5}}}"#
        );
    }

    #[test]
    fn test_sound_shorthand_replaces_previous() {
        let payload = Payload::new().sound("Default.caf").sound_volume(0.3);
        assert_eq!(
            json(&payload),
            r#"{"aps":{"sound":{"critical":1,"name":"default","volume":0.3}}}"#
        );
    }

    #[test]
    fn test_content_available() {
        let payload = Payload::new().content_available();
        assert_eq!(json(&payload), r#"{"aps":{"content-available":1}}"#);
    }

    #[test]
    fn test_mutable_content() {
        let payload = Payload::new().mutable_content();
        assert_eq!(json(&payload), r#"{"aps":{"mutable-content":1}}"#);
    }

    #[test]
    fn test_custom() {
        let payload = Payload::new().custom("key", "val");
        assert_eq!(json(&payload), r#"{"aps":{},"key":"val"}"#);
    }

    #[test]
    fn test_custom_map() {
        let payload = Payload::new().custom("key", serde_json::json!({"map": 1}));
        assert_eq!(json(&payload), r#"{"aps":{},"key":{"map":1}}"#);
    }

    #[test]
    fn test_alert_title() {
        let payload = Payload::new().alert_title("hello");
        assert_eq!(json(&payload), r#"{"aps":{"alert":{"title":"hello"}}}"#);
    }

    #[test]
    fn test_alert_title_loc_key() {
        let payload = Payload::new().alert_title_loc_key("GAME_PLAY_REQUEST_FORMAT");
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":{"title-loc-key":"GAME_PLAY_REQUEST_FORMAT"}}}"#
        );
    }

    #[test]
    fn test_alert_loc_args() {
        let payload = Payload::new().alert_loc_args(["Jenna", "Frank"]);
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":{"loc-args":["Jenna","Frank"]}}}"#
        );
    }

    #[test]
    fn test_alert_title_loc_args() {
        let payload = Payload::new().alert_title_loc_args(["Jenna", "Frank"]);
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":{"title-loc-args":["Jenna","Frank"]}}}"#
        );
    }

    #[test]
    fn test_alert_subtitle() {
        let payload = Payload::new().alert_subtitle("hello");
        assert_eq!(json(&payload), r#"{"aps":{"alert":{"subtitle":"hello"}}}"#);
    }

    #[test]
    fn test_alert_body() {
        let payload = Payload::new().alert_body("body");
        assert_eq!(json(&payload), r#"{"aps":{"alert":{"body":"body"}}}"#);
    }

    #[test]
    fn test_alert_launch_image() {
        let payload = Payload::new().alert_launch_image("Default.png");
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":{"launch-image":"Default.png"}}}"#
        );
    }

    #[test]
    fn test_alert_loc_key() {
        let payload = Payload::new().alert_loc_key("LOC");
        assert_eq!(json(&payload), r#"{"aps":{"alert":{"loc-key":"LOC"}}}"#);
    }

    #[test]
    fn test_alert_action() {
        let payload = Payload::new().alert_action("action");
        assert_eq!(json(&payload), r#"{"aps":{"alert":{"action":"action"}}}"#);
    }

    #[test]
    fn test_alert_action_loc_key() {
        let payload = Payload::new().alert_action_loc_key("PLAY");
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":{"action-loc-key":"PLAY"}}}"#
        );
    }

    #[test]
    fn test_alert_promotion_drops_string() {
        let payload = Payload::new().alert("hello").alert_title("title");
        assert_eq!(json(&payload), r#"{"aps":{"alert":{"title":"title"}}}"#);
    }

    #[test]
    fn test_category() {
        let payload = Payload::new().category("NEW_MESSAGE_CATEGORY");
        assert_eq!(
            json(&payload),
            r#"{"aps":{"category":"NEW_MESSAGE_CATEGORY"}}"#
        );
    }

    #[test]
    fn test_mdm() {
        let payload = Payload::new().mdm("996ac527-9993-4a0a-8528-60b2b3c2f52b");
        assert_eq!(
            json(&payload),
            r#"{"aps":{},"mdm":"996ac527-9993-4a0a-8528-60b2b3c2f52b"}"#
        );
    }

    #[test]
    fn test_thread_id() {
        let payload = Payload::new().thread_id("THREAD_ID");
        assert_eq!(json(&payload), r#"{"aps":{"thread-id":"THREAD_ID"}}"#);
    }

    #[test]
    fn test_url_args() {
        let payload = Payload::new().url_args(["a", "b"]);
        assert_eq!(json(&payload), r#"{"aps":{"url-args":["a","b"]}}"#);
    }

    #[test]
    fn test_alert_summary_arg() {
        let payload = Payload::new().alert_summary_arg("Robert");
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":{"summary-arg":"Robert"}}}"#
        );
    }

    #[test]
    fn test_alert_summary_arg_count() {
        let payload = Payload::new().alert_summary_arg_count(3);
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":{"summary-arg-count":3}}}"#
        );
    }

    #[test]
    fn test_interruption_level_passive() {
        let payload = Payload::new().interruption_level(InterruptionLevel::Passive);
        assert_eq!(json(&payload), r#"{"aps":{"interruption-level":"passive"}}"#);
    }

    #[test]
    fn test_interruption_level_active() {
        let payload = Payload::new().interruption_level(InterruptionLevel::Active);
        assert_eq!(json(&payload), r#"{"aps":{"interruption-level":"active"}}"#);
    }

    #[test]
    fn test_interruption_level_time_sensitive() {
        let payload = Payload::new().interruption_level(InterruptionLevel::TimeSensitive);
        assert_eq!(
            json(&payload),
            r#"{"aps":{"interruption-level":"time-sensitive"}}"#
        );
    }

    #[test]
    fn test_interruption_level_critical() {
        let payload = Payload::new().interruption_level(InterruptionLevel::Critical);
        assert_eq!(
            json(&payload),
            r#"{"aps":{"interruption-level":"critical"}}"#
        );
    }

    #[test]
    fn test_relevance_score() {
        let payload = Payload::new().relevance_score(0.1);
        assert_eq!(json(&payload), r#"{"aps":{"relevance-score":0.1}}"#);
    }

    #[test]
    fn test_relevance_score_zero() {
        let payload = Payload::new().relevance_score(0.0);
        assert_eq!(json(&payload), r#"{"aps":{"relevance-score":0}}"#);
    }

    #[test]
    fn test_unset_relevance_score() {
        let payload = Payload::new().relevance_score(0.1).unset_relevance_score();
        assert_eq!(json(&payload), r#"{"aps":{}}"#);
    }

    #[test]
    fn test_combined() {
        let payload = Payload::new()
            .alert("hello")
            .badge(1)
            .sound("Default.caf")
            .interruption_level(InterruptionLevel::Active)
            .relevance_score(0.1)
            .custom("key", "val");
        assert_eq!(
            json(&payload),
            r#"{"aps":{"alert":"hello","badge":1,"interruption-level":"active","relevance-score":0.1,"sound":"Default.caf"},"key":"val"}"#
        );
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Payload::new().to_json().unwrap(), r#"{"aps":{}}"#);
    }
}
