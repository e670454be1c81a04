use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use engage_core::{EngageConfig, InfluenceConfig};
use tracing::debug;

use super::types::{RawEngageConfig, RawInfluenceConfig};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + explicit file)
    pub fn load(explicit: Option<&Path>) -> Result<EngageConfig> {
        let mut layers = Vec::new();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            layers.push(user_path);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            layers.push(project_path);
        }

        // Layer 3: File named on the command line, which must exist
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            layers.push(path.to_path_buf());
        }

        Self::load_layers(&layers)
    }

    /// Merge the given files in order, later files overriding earlier ones
    pub fn load_layers(paths: &[PathBuf]) -> Result<EngageConfig> {
        let mut raw = RawEngageConfig::default();
        for path in paths {
            debug!(path = %path.display(), "Loading config layer");
            let overlay = Self::read_raw(path)?;
            raw = Self::merge_raw(raw, overlay);
        }

        // Convert to final config with defaults applied
        Self::finalize(raw)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("engage").join("config.toml"))
    }

    /// Get project config path
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".engage/config.toml")
    }

    fn read_raw(path: &Path) -> Result<RawEngageConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawEngageConfig, overlay: RawEngageConfig) -> RawEngageConfig {
        RawEngageConfig {
            app_id: overlay.app_id.or(base.app_id),
            influence: RawInfluenceConfig {
                enabled: overlay.influence.enabled.or(base.influence.enabled),
                indirect_window_minutes: overlay
                    .influence
                    .indirect_window_minutes
                    .or(base.influence.indirect_window_minutes),
                notification_limit: overlay
                    .influence
                    .notification_limit
                    .or(base.influence.notification_limit),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawEngageConfig) -> Result<EngageConfig> {
        let defaults = InfluenceConfig::default();
        let indirect_window_minutes = raw
            .influence
            .indirect_window_minutes
            .unwrap_or(defaults.indirect_window_minutes);
        if indirect_window_minutes <= 0 {
            bail!(
                "influence.indirect_window_minutes must be positive, got {}",
                indirect_window_minutes
            );
        }
        if TimeDelta::try_minutes(indirect_window_minutes).is_none() {
            bail!(
                "influence.indirect_window_minutes is out of range: {}",
                indirect_window_minutes
            );
        }

        Ok(EngageConfig {
            app_id: raw.app_id,
            influence: InfluenceConfig {
                enabled: raw.influence.enabled.unwrap_or(defaults.enabled),
                indirect_window_minutes,
                notification_limit: raw
                    .influence
                    .notification_limit
                    .unwrap_or(defaults.notification_limit),
            },
        })
    }
}
