//! Application settings stored in the `app_settings` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::SettingType;

/// Well-known setting keys.
pub mod keys {
    pub const DB_VERSION: &str = "db_version";
    pub const LEVEL_CURVE: &str = "level_curve";
    pub const XP_PER_LEVEL: &str = "xp_per_level";
    pub const LEVEL_BASE_XP: &str = "level_base_xp";
    pub const LEVEL_GROWTH: &str = "level_growth";
    pub const LEVEL_THRESHOLDS: &str = "level_thresholds";
    pub const DEFAULT_TASK_XP: &str = "default_task_xp";
    pub const SESSION_XP_PER_MINUTE: &str = "session_xp_per_minute";
    pub const THEME_MODE: &str = "theme_mode";
}

/// A typed key-value configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSetting {
    pub key: String,
    pub value: String,
    pub setting_type: SettingType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl AppSetting {
    /// Interprets the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.value.trim().parse().ok()
    }

    /// Interprets the value as a boolean (`true`/`false`/`1`/`0`).
    pub fn as_bool(&self) -> Option<bool> {
        parse_bool(&self.value)
    }
}

/// Parses the boolean spellings accepted for BOOLEAN settings.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
