//! Error types for engage-core

use thiserror::Error;

/// Errors raised while reading a notification payload
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Malformed notification payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid JSON in notification payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notification payload carries no notification id")]
    MissingNotificationId,
}

/// Errors returned by the notification backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend rejected request with status {status_code}")]
    Rejected {
        status_code: u16,
        response: Option<String>,
    },
}

/// Errors reading the stored open-destination settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Malformed open settings: {0}")]
    Malformed(String),
}

/// Errors decoding an outcome event
#[derive(Error, Debug)]
pub enum OutcomeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("Invalid outcome JSON: {0}")]
    Json(#[from] serde_json::Error),
}
