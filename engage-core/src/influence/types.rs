//! Influence classification types

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a session relates to the notifications the device received
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfluenceType {
    /// Session started by tapping a notification
    Direct,
    /// Session started shortly after notifications were received
    Indirect,
    /// No notification can be credited
    #[default]
    Unattributed,
    /// Attribution is turned off
    Disabled,
}

impl InfluenceType {
    /// Wire name of the influence type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "DIRECT",
            Self::Indirect => "INDIRECT",
            Self::Unattributed => "UNATTRIBUTED",
            Self::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for InfluenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Influence {
    pub influence_type: InfluenceType,
    /// Notifications credited with the session, oldest first
    #[serde(default)]
    pub notification_ids: Vec<String>,
}

impl Influence {
    pub fn direct(notification_id: impl Into<String>) -> Self {
        Self {
            influence_type: InfluenceType::Direct,
            notification_ids: vec![notification_id.into()],
        }
    }

    pub fn indirect(notification_ids: Vec<String>) -> Self {
        Self {
            influence_type: InfluenceType::Indirect,
            notification_ids,
        }
    }

    pub fn unattributed() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            influence_type: InfluenceType::Disabled,
            notification_ids: Vec::new(),
        }
    }
}
