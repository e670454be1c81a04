//! Outcome event value type and its two JSON encodings

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::params::OutcomeEventParams;
use crate::error::OutcomeError;
use crate::influence::InfluenceType;

const SESSION: &str = "session";
const NOTIFICATION_IDS: &str = "notification_ids";
const OUTCOME_ID: &str = "id";
const TIMESTAMP: &str = "timestamp";
const WEIGHT: &str = "weight";

/// Which fields an encoding carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    /// Every field, sentinels included; used for local queuing
    Full,
    /// Only populated fields; the wire format sent to the backend
    Compact,
}

/// One attribution record for a measured outcome
///
/// An empty `notification_ids` list means "no notifications", a `timestamp`
/// of zero means "unset" and a `weight` at or below zero means "no weight".
/// Non-finite weights are stored as zero since JSON cannot carry them.
#[derive(Debug, Clone)]
pub struct OutcomeEvent {
    session: InfluenceType,
    notification_ids: Vec<String>,
    name: String,
    timestamp: i64,
    weight: f64,
}

/// Decoding view shared by both encodings; absent fields are sentinels
#[derive(Deserialize)]
struct WireOutcome {
    #[serde(default)]
    session: InfluenceType,
    #[serde(default)]
    notification_ids: Option<Vec<String>>,
    id: Option<String>,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    weight: f64,
}

impl OutcomeEvent {
    pub fn new(
        session: InfluenceType,
        notification_ids: Vec<String>,
        name: impl Into<String>,
        timestamp: i64,
        weight: f64,
    ) -> Self {
        Self {
            session,
            notification_ids,
            name: name.into(),
            timestamp,
            weight: if weight.is_finite() { weight } else { 0.0 },
        }
    }

    /// Build a v1 event from v2 params
    ///
    /// A non-empty direct id list wins, then a non-empty indirect list;
    /// otherwise the event is unattributed with no ids.
    pub fn from_params(params: &OutcomeEventParams) -> Self {
        let source = params.outcome_source.as_ref();
        let direct = source
            .and_then(|s| s.direct_body.as_ref())
            .and_then(|body| body.notification_ids.as_ref())
            .filter(|ids| !ids.is_empty());
        let indirect = source
            .and_then(|s| s.indirect_body.as_ref())
            .and_then(|body| body.notification_ids.as_ref())
            .filter(|ids| !ids.is_empty());

        let (session, notification_ids) = match (direct, indirect) {
            (Some(ids), _) => (InfluenceType::Direct, ids.clone()),
            (None, Some(ids)) => (InfluenceType::Indirect, ids.clone()),
            (None, None) => (InfluenceType::Unattributed, Vec::new()),
        };

        Self::new(
            session,
            notification_ids,
            params.outcome_id.clone(),
            params.timestamp,
            params.weight,
        )
    }

    pub fn session(&self) -> InfluenceType {
        self.session
    }

    pub fn notification_ids(&self) -> &[String] {
        &self.notification_ids
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Encode the event; `Compact` omits unset fields instead of writing nulls
    pub fn to_json(&self, mode: EncodingMode) -> Value {
        let full = mode == EncodingMode::Full;
        let mut json = Map::new();

        if full {
            json.insert(SESSION.into(), json!(self.session));
        }
        if full || !self.notification_ids.is_empty() {
            json.insert(NOTIFICATION_IDS.into(), json!(self.notification_ids));
        }
        json.insert(OUTCOME_ID.into(), json!(self.name));
        if full || self.timestamp > 0 {
            json.insert(TIMESTAMP.into(), json!(self.timestamp));
        }
        if full || self.weight > 0.0 {
            json.insert(WEIGHT.into(), json!(self.weight));
        }

        Value::Object(json)
    }

    /// Full encoding used for local persistence and retry
    pub fn to_json_object(&self) -> Value {
        self.to_json(EncodingMode::Full)
    }

    /// Compact encoding sent to the backend
    pub fn to_json_object_for_measure(&self) -> Value {
        self.to_json(EncodingMode::Compact)
    }

    /// Decode either encoding
    pub fn from_json(value: &Value) -> Result<Self, OutcomeError> {
        let wire = WireOutcome::deserialize(value)?;
        let name = wire.id.ok_or(OutcomeError::MissingField(OUTCOME_ID))?;
        if name.is_empty() {
            return Err(OutcomeError::InvalidField {
                field: OUTCOME_ID,
                message: "outcome name must not be empty".to_string(),
            });
        }

        Ok(Self::new(
            wire.session,
            wire.notification_ids.unwrap_or_default(),
            name,
            wire.timestamp,
            wire.weight,
        ))
    }

    /// Decode from a JSON string
    pub fn from_json_str(raw: &str) -> Result<Self, OutcomeError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json(&value)
    }
}

impl PartialEq for OutcomeEvent {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session
            && self.notification_ids == other.notification_ids
            && self.name == other.name
            && self.timestamp == other.timestamp
            && self.weight.to_bits() == other.weight.to_bits()
    }
}

impl Eq for OutcomeEvent {}

impl Hash for OutcomeEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.session.hash(state);
        self.notification_ids.hash(state);
        self.name.hash(state);
        self.timestamp.hash(state);
        self.weight.to_bits().hash(state);
    }
}

impl fmt::Display for OutcomeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutcomeEvent{{session={}, notification_ids={:?}, name='{}', timestamp={}, weight={}}}",
            self.session, self.notification_ids, self.name, self.timestamp, self.weight
        )
    }
}
