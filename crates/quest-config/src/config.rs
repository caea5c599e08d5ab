//! Configuration types and loading for the quest system.
//!
//! The main entry point is [`QuestConfig`], the contents of
//! `.quest/config.yaml`. [`load_config`] layers serialized defaults, the YAML
//! file and `QUEST_`-prefixed environment variables; [`save_config`] writes
//! the file back.

use std::collections::HashMap;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quest_core::enums::SettingType;
use quest_core::level::LevelCurve;
use quest_core::setting::keys;

/// File name of the config inside `.quest/`.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Prefix of environment variables that override config values.
pub const ENV_PREFIX: &str = "QUEST_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration file contained invalid YAML.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A layer of the merged configuration could not be extracted.
    #[error("invalid configuration: {0}")]
    Figment(#[from] figment::Error),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Gamification section
// ---------------------------------------------------------------------------

/// XP and level tuning, applied to `app_settings` at `quest init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamificationConfig {
    /// `linear`, `geometric` or `table`.
    #[serde(default = "default_level_curve")]
    pub level_curve: String,

    #[serde(default = "default_xp_per_level")]
    pub xp_per_level: i64,

    /// XP needed for level 2 on the geometric curve.
    #[serde(default = "default_level_base_xp")]
    pub level_base_xp: i64,

    /// Cost ratio between consecutive levels on the geometric curve.
    #[serde(default = "default_level_growth")]
    pub level_growth: f64,

    /// Cumulative XP for levels 2, 3, ... on the table curve.
    #[serde(default)]
    pub level_thresholds: Vec<i64>,

    #[serde(default = "default_task_xp")]
    pub default_task_xp: i64,

    #[serde(default = "default_session_xp_per_minute")]
    pub session_xp_per_minute: i64,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            level_curve: default_level_curve(),
            xp_per_level: default_xp_per_level(),
            level_base_xp: default_level_base_xp(),
            level_growth: default_level_growth(),
            level_thresholds: Vec::new(),
            default_task_xp: default_task_xp(),
            session_xp_per_minute: default_session_xp_per_minute(),
        }
    }
}

fn default_level_curve() -> String {
    "linear".to_string()
}

fn default_xp_per_level() -> i64 {
    100
}

fn default_level_base_xp() -> i64 {
    100
}

fn default_level_growth() -> f64 {
    1.5
}

fn default_task_xp() -> i64 {
    10
}

fn default_session_xp_per_minute() -> i64 {
    1
}

impl GamificationConfig {
    /// The section as `(key, value, type)` settings rows.
    pub fn settings(&self) -> Vec<(&'static str, String, SettingType)> {
        let thresholds = format!(
            "[{}]",
            self.level_thresholds
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
        vec![
            (keys::LEVEL_CURVE, self.level_curve.clone(), SettingType::String),
            (keys::XP_PER_LEVEL, self.xp_per_level.to_string(), SettingType::Integer),
            (keys::LEVEL_BASE_XP, self.level_base_xp.to_string(), SettingType::Integer),
            (keys::LEVEL_GROWTH, self.level_growth.to_string(), SettingType::String),
            (keys::LEVEL_THRESHOLDS, thresholds, SettingType::Json),
            (keys::DEFAULT_TASK_XP, self.default_task_xp.to_string(), SettingType::Integer),
            (
                keys::SESSION_XP_PER_MINUTE,
                self.session_xp_per_minute.to_string(),
                SettingType::Integer,
            ),
        ]
    }

    /// The level curve these values describe.
    pub fn curve(&self) -> Result<LevelCurve> {
        let map: HashMap<String, String> = self
            .settings()
            .into_iter()
            .map(|(k, v, _)| (k.to_string(), v))
            .collect();
        LevelCurve::from_settings(&map).map_err(|e| ConfigError::InvalidValue {
            key: "gamification".to_string(),
            reason: e.to_string(),
        })
    }

    /// Checks the curve and the XP rates.
    pub fn validate(&self) -> Result<()> {
        self.curve()?;
        if self.default_task_xp < 0 {
            return Err(ConfigError::InvalidValue {
                key: "gamification.default_task_xp".to_string(),
                reason: format!("must not be negative (got {})", self.default_task_xp),
            });
        }
        if self.session_xp_per_minute < 0 {
            return Err(ConfigError::InvalidValue {
                key: "gamification.session_xp_per_minute".to_string(),
                reason: format!("must not be negative (got {})", self.session_xp_per_minute),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full quest configuration, corresponding to `.quest/config.yaml`.
///
/// All fields use `serde` defaults so that a partially-specified YAML file
/// is deserialized with sensible default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuestConfig {
    /// Database path override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,

    /// Output JSON instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub gamification: GamificationConfig,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The layered sources for the config in `quest_dir`.
///
/// Later layers win: defaults, then `config.yaml` (skipped when missing),
/// then `QUEST_*` environment variables with `__` as the nesting separator
/// (`QUEST_GAMIFICATION__XP_PER_LEVEL=250`).
pub fn layered(quest_dir: &Path) -> Figment {
    Figment::from(Serialized::defaults(QuestConfig::default()))
        .merge(Yaml::file(quest_dir.join(CONFIG_FILE_NAME)))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration for the given `.quest/` directory.
///
/// # Errors
///
/// Returns [`ConfigError::Figment`] if a layer has the wrong shape, or
/// [`ConfigError::InvalidValue`] if the gamification values are unusable.
pub fn load_config(quest_dir: &Path) -> Result<QuestConfig> {
    extract(layered(quest_dir))
}

/// Extracts and validates a config from an arbitrary figment.
pub fn extract(figment: Figment) -> Result<QuestConfig> {
    let config: QuestConfig = figment.extract()?;
    config.gamification.validate()?;
    Ok(config)
}

/// Save configuration to `config.yaml` inside the given `.quest/` directory.
///
/// The directory is created if it does not exist.
pub fn save_config(quest_dir: &Path, config: &QuestConfig) -> Result<()> {
    std::fs::create_dir_all(quest_dir)?;

    let config_path = quest_dir.join(CONFIG_FILE_NAME);
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(config_path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let cfg = QuestConfig::default();
        assert!(cfg.db.is_none());
        assert!(!cfg.json);
        assert_eq!(cfg.gamification.xp_per_level, 100);
        assert_eq!(cfg.gamification.curve().unwrap(), LevelCurve::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = extract(
            Figment::from(Serialized::defaults(QuestConfig::default()))
                .merge(Yaml::file(dir.path().join(CONFIG_FILE_NAME))),
        )
        .unwrap();
        assert_eq!(cfg, QuestConfig::default());
    }

    #[test]
    fn roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let quest_dir = dir.path().join(".quest");

        let mut cfg = QuestConfig::default();
        cfg.db = Some("custom.db".to_string());
        cfg.gamification.xp_per_level = 250;

        save_config(&quest_dir, &cfg).unwrap();
        let loaded = extract(
            Figment::from(Serialized::defaults(QuestConfig::default()))
                .merge(Yaml::file(quest_dir.join(CONFIG_FILE_NAME))),
        )
        .unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "gamification:\n  level_curve: geometric\n  level_growth: 2.0\n",
        )
        .unwrap();
        let cfg = extract(
            Figment::from(Serialized::defaults(QuestConfig::default()))
                .merge(Yaml::file(dir.path().join(CONFIG_FILE_NAME))),
        )
        .unwrap();
        assert_eq!(cfg.gamification.level_base_xp, 100);
        assert_eq!(
            cfg.gamification.curve().unwrap(),
            LevelCurve::Geometric {
                base: 100,
                ratio: 2.0
            }
        );
    }

    #[test]
    fn later_layer_wins() {
        let figment = Figment::from(Serialized::defaults(QuestConfig::default()))
            .merge(Serialized::default("gamification.default_task_xp", 25));
        let cfg = extract(figment).unwrap();
        assert_eq!(cfg.gamification.default_task_xp, 25);
    }

    #[test]
    fn invalid_curve_rejected() {
        let mut cfg = GamificationConfig::default();
        cfg.level_curve = "table".to_string();
        cfg.level_thresholds = vec![100, 50];
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));

        let mut cfg = GamificationConfig::default();
        cfg.session_xp_per_minute = -1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn settings_rows_cover_section() {
        let mut cfg = GamificationConfig::default();
        cfg.level_thresholds = vec![50, 150];
        let rows = cfg.settings();
        assert_eq!(rows.len(), 7);
        let thresholds = rows
            .iter()
            .find(|(k, _, _)| *k == keys::LEVEL_THRESHOLDS)
            .unwrap();
        assert_eq!(thresholds.1, "[50,150]");
        assert_eq!(thresholds.2, SettingType::Json);
    }
}
