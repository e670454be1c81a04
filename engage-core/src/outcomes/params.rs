//! v2 outcome parameters

use serde::{Deserialize, Serialize};

use crate::influence::{Influence, InfluenceType};

/// Ids credited by one influence channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSourceBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_app_message_ids: Option<Vec<String>>,
}

impl OutcomeSourceBody {
    pub fn with_notification_ids(notification_ids: Vec<String>) -> Self {
        Self {
            notification_ids: Some(notification_ids),
            in_app_message_ids: None,
        }
    }
}

/// Direct and indirect sources of an outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSource {
    #[serde(default, rename = "direct", skip_serializing_if = "Option::is_none")]
    pub direct_body: Option<OutcomeSourceBody>,
    #[serde(default, rename = "indirect", skip_serializing_if = "Option::is_none")]
    pub indirect_body: Option<OutcomeSourceBody>,
}

impl OutcomeSource {
    /// Source describing a session classification, if it credits anything
    pub fn from_influence(influence: &Influence) -> Option<Self> {
        let body = OutcomeSourceBody::with_notification_ids(influence.notification_ids.clone());
        match influence.influence_type {
            InfluenceType::Direct => Some(Self {
                direct_body: Some(body),
                indirect_body: None,
            }),
            InfluenceType::Indirect => Some(Self {
                direct_body: None,
                indirect_body: Some(body),
            }),
            InfluenceType::Unattributed | InfluenceType::Disabled => None,
        }
    }
}

/// Parameters of a v2 outcome request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEventParams {
    #[serde(rename = "id")]
    pub outcome_id: String,
    #[serde(default, rename = "sources", skip_serializing_if = "Option::is_none")]
    pub outcome_source: Option<OutcomeSource>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub timestamp: i64,
}

impl OutcomeEventParams {
    pub fn new(
        outcome_id: impl Into<String>,
        outcome_source: Option<OutcomeSource>,
        weight: f64,
        timestamp: i64,
    ) -> Self {
        Self {
            outcome_id: outcome_id.into(),
            outcome_source,
            weight,
            timestamp,
        }
    }

    /// Params for an outcome credited according to `influence`
    pub fn for_influence(
        outcome_id: impl Into<String>,
        influence: &Influence,
        weight: f64,
        timestamp: i64,
    ) -> Self {
        Self::new(
            outcome_id,
            OutcomeSource::from_influence(influence),
            weight,
            timestamp,
        )
    }
}
