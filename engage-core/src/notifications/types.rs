//! Notification callback types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A notification handed to the listener on receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationGenerationJob {
    /// Backend-assigned notification id
    pub api_notification_id: String,
    /// Platform correlation id for the posted notification
    pub android_id: i32,
    /// Payload as delivered by the push transport
    pub payload: Value,
}

impl NotificationGenerationJob {
    pub fn new(api_notification_id: impl Into<String>, android_id: i32, payload: Value) -> Self {
        Self {
            api_notification_id: api_notification_id.into(),
            android_id,
            payload,
        }
    }
}

/// Foreground surface an open was delivered to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    pub name: String,
}

impl Surface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Why the application was last brought up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppEntryAction {
    /// The user tapped a notification
    NotificationClick,
    /// The user opened the app directly
    #[default]
    AppOpen,
    /// The app was closed
    AppClose,
}

/// Device family reported to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Android,
    Amazon,
    Huawei,
}

impl DeviceType {
    /// Numeric code expected by the backend
    pub fn code(&self) -> i32 {
        match self {
            Self::Android => 1,
            Self::Amazon => 2,
            Self::Huawei => 13,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_new() {
        let job = NotificationGenerationJob::new("n-1", 7, json!({ "title": "Hi" }));
        assert_eq!(job.api_notification_id, "n-1");
        assert_eq!(job.android_id, 7);
    }

    #[test]
    fn test_default_entry_action_is_app_open() {
        assert_eq!(AppEntryAction::default(), AppEntryAction::AppOpen);
    }

    #[test]
    fn test_device_type_codes() {
        assert_eq!(DeviceType::Android.code(), 1);
        assert_eq!(DeviceType::Amazon.code(), 2);
        assert_eq!(DeviceType::Huawei.code(), 13);
    }

    #[test]
    fn test_entry_action_serialization() {
        let json = serde_json::to_string(&AppEntryAction::NotificationClick).unwrap();
        assert_eq!(json, "\"notification_click\"");
    }
}
