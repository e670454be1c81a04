//! Normalized views over raw notification payloads
//!
//! Push payloads carry the backend fields inside a `custom` member, which
//! may arrive either as a nested object or as a JSON-encoded string.

use serde_json::{Map, Value};
use tracing::warn;

use crate::clock::Clock;
use crate::error::NotificationError;

/// Payload key the platform correlation id is injected under
pub const ANDROID_NOTIFICATION_ID_KEY: &str = "androidNotificationId";

const CUSTOM: &str = "custom";
const CUSTOM_NOTIFICATION_ID: &str = "i";
const CUSTOM_TEMPLATE_ID: &str = "ti";
const CUSTOM_TEMPLATE_NAME: &str = "tn";
const TITLE: &str = "title";
const BODY: &str = "alert";
const SENT_TIME: &str = "google.sent_time";
const TTL: &str = "google.ttl";

/// Time to live, in seconds, when the payload does not carry one
pub const DEFAULT_TTL_SECONDS: i64 = 259_200;

const CAMPAIGN_TITLE_CHARS: usize = 10;

/// Normalized notification view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notification {
    pub notification_id: Option<String>,
    pub template_id: Option<String>,
    pub template_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub android_notification_id: Option<i32>,
    /// Epoch milliseconds the notification was sent
    pub sent_time: i64,
    /// Seconds the notification stays relevant
    pub ttl: i64,
    /// Older notifications collapsed into this one
    pub grouped_notifications: Vec<Notification>,
    pub raw_payload: Value,
}

/// View built from the data list of an open callback
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenedResult {
    pub notification: Notification,
}

fn custom_object(
    payload: &Map<String, Value>,
) -> Result<Option<Map<String, Value>>, NotificationError> {
    match payload.get(CUSTOM) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(custom)) => Ok(Some(custom.clone())),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(custom) => Ok(Some(custom)),
            _ => Err(NotificationError::MalformedPayload(
                "custom is not an object".to_string(),
            )),
        },
        Some(_) => Err(NotificationError::MalformedPayload(
            "custom has an unexpected type".to_string(),
        )),
    }
}

fn non_empty_str(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Integer member that may also arrive as a decimal string
fn lenient_i64(object: &Map<String, Value>, key: &str) -> Option<i64> {
    match object.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract the backend notification id, or `None` when the payload is
/// malformed or carries no id
pub fn notification_id_from_json(payload: &Value) -> Option<String> {
    let object = payload.as_object()?;
    let custom = custom_object(object).ok().flatten()?;
    non_empty_str(&custom, CUSTOM_NOTIFICATION_ID)
}

impl Notification {
    /// Parse a single payload
    pub fn from_payload(payload: &Value, clock: &dyn Clock) -> Result<Self, NotificationError> {
        let object = payload.as_object().ok_or_else(|| {
            NotificationError::MalformedPayload("payload is not an object".to_string())
        })?;
        let custom = custom_object(object)?.unwrap_or_default();

        Ok(Self {
            notification_id: non_empty_str(&custom, CUSTOM_NOTIFICATION_ID),
            template_id: non_empty_str(&custom, CUSTOM_TEMPLATE_ID),
            template_name: non_empty_str(&custom, CUSTOM_TEMPLATE_NAME),
            title: object.get(TITLE).and_then(Value::as_str).map(str::to_string),
            body: object.get(BODY).and_then(Value::as_str).map(str::to_string),
            android_notification_id: lenient_i64(object, ANDROID_NOTIFICATION_ID_KEY)
                .and_then(|id| i32::try_from(id).ok()),
            sent_time: lenient_i64(object, SENT_TIME)
                .unwrap_or_else(|| clock.current_time_millis()),
            ttl: lenient_i64(object, TTL).unwrap_or(DEFAULT_TTL_SECONDS),
            grouped_notifications: Vec::new(),
            raw_payload: payload.clone(),
        })
    }

    /// Name analytics reports the notification's campaign under
    pub fn campaign_name(&self) -> String {
        match (&self.template_name, &self.template_id, &self.title) {
            (Some(name), Some(id), _) => format!("{} - {}", name, id),
            (_, _, Some(title)) => title.chars().take(CAMPAIGN_TITLE_CHARS).collect(),
            _ => String::new(),
        }
    }
}

impl OpenedResult {
    /// Build the view from an open callback's data list
    ///
    /// The first element is the notification that was tapped; any others
    /// become its grouped notifications. Only an empty list or an unreadable
    /// first element is an error; unreadable grouped elements are skipped.
    pub fn from_data(data: &[Value], clock: &dyn Clock) -> Result<Self, NotificationError> {
        let (first, rest) = data.split_first().ok_or_else(|| {
            NotificationError::MalformedPayload("notification list is empty".to_string())
        })?;

        let mut notification = Notification::from_payload(first, clock)?;
        notification.grouped_notifications = rest
            .iter()
            .enumerate()
            .filter_map(|(i, payload)| match Notification::from_payload(payload, clock) {
                Ok(grouped) => Some(grouped),
                Err(e) => {
                    warn!(index = i + 1, "Skipping unreadable grouped notification: {}", e);
                    None
                }
            })
            .collect();

        Ok(Self { notification })
    }

    pub fn notification_id(&self) -> Option<&str> {
        self.notification.notification_id.as_deref()
    }

    pub fn campaign_name(&self) -> String {
        self.notification.campaign_name()
    }
}
