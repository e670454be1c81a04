use serde::Deserialize;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEngageConfig {
    pub app_id: Option<String>,

    #[serde(default)]
    pub influence: RawInfluenceConfig,
}

/// Influence settings as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInfluenceConfig {
    pub enabled: Option<bool>,

    pub indirect_window_minutes: Option<i64>,

    pub notification_limit: Option<usize>,
}
