//! Configuration for the engagement pipeline

use serde::{Deserialize, Serialize};

use crate::notifications::ConfigSource;

/// Default window, in minutes, within which a received notification
/// indirectly influences a new session
pub const DEFAULT_INDIRECT_WINDOW_MINUTES: i64 = 24 * 60;

/// Default number of received notifications remembered for attribution
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 10;

/// Configuration for the engagement pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngageConfig {
    /// Application id reported with every opened confirmation
    #[serde(default)]
    pub app_id: Option<String>,

    /// Influence attribution settings
    #[serde(default)]
    pub influence: InfluenceConfig,
}

/// Settings for time-windowed influence attribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfluenceConfig {
    /// Whether sessions are attributed to notifications at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minutes a received notification stays eligible for indirect attribution
    #[serde(default = "default_indirect_window")]
    pub indirect_window_minutes: i64,

    /// Maximum number of received notifications remembered
    #[serde(default = "default_notification_limit")]
    pub notification_limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_indirect_window() -> i64 {
    DEFAULT_INDIRECT_WINDOW_MINUTES
}

fn default_notification_limit() -> usize {
    DEFAULT_NOTIFICATION_LIMIT
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            indirect_window_minutes: DEFAULT_INDIRECT_WINDOW_MINUTES,
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
        }
    }
}

impl InfluenceConfig {
    /// Create a config with attribution turned off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl EngageConfig {
    /// Create a config for the given application id
    pub fn with_app_id(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            ..Self::default()
        }
    }
}

impl ConfigSource for EngageConfig {
    fn app_id(&self) -> Option<String> {
        self.app_id.clone()
    }
}
