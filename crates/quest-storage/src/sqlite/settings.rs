//! `app_settings` key-value operations for [`SqliteStore`].

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use quest_core::enums::SettingType;
use quest_core::setting::AppSetting;
use quest_core::validation::validate_setting_value;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::time::{format_datetime, get_datetime};

const SETTING_COLUMNS: &str = "setting_key, setting_value, setting_type, description, updated_at";

fn scan_setting(row: &Row<'_>) -> rusqlite::Result<AppSetting> {
    Ok(AppSetting {
        key: row.get("setting_key")?,
        value: row.get("setting_value")?,
        setting_type: SettingType::from(row.get::<_, String>("setting_type")?),
        description: row.get("description")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers (shared with Transaction)
// ---------------------------------------------------------------------------

pub(crate) fn get_setting_on_conn(conn: &Connection, key: &str) -> Result<AppSetting> {
    let sql = format!("SELECT {SETTING_COLUMNS} FROM app_settings WHERE setting_key = ?1");
    conn.query_row(&sql, params![key], scan_setting)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("setting", key),
            other => StorageError::Query(other),
        })
}

/// Reads an integer setting, falling back to `default` when it is absent.
pub(crate) fn get_setting_i64_on_conn(conn: &Connection, key: &str, default: i64) -> Result<i64> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT setting_value FROM app_settings WHERE setting_key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| {
            StorageError::validation(format!("setting {key} is not an integer: {v:?}"))
        }),
    }
}

pub(crate) fn get_all_settings_on_conn(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT setting_key, setting_value FROM app_settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (k, v) = row?;
        map.insert(k, v);
    }
    Ok(map)
}

pub(crate) fn set_setting_on_conn(
    conn: &Connection,
    key: &str,
    value: &str,
    setting_type: &SettingType,
) -> Result<()> {
    if key.trim().is_empty() {
        return Err(StorageError::validation("setting key is required"));
    }
    validate_setting_value(key, value, setting_type)?;
    conn.execute(
        "INSERT INTO app_settings (setting_key, setting_value, setting_type, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(setting_key) DO UPDATE SET
             setting_value = excluded.setting_value,
             setting_type  = excluded.setting_type,
             updated_at    = excluded.updated_at",
        params![key, value, setting_type.as_str(), format_datetime(&Utc::now())],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteStore methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn get_setting_impl(&self, key: &str) -> Result<AppSetting> {
        let conn = self.lock_conn()?;
        get_setting_on_conn(&conn, key)
    }

    pub fn set_setting_impl(&self, key: &str, value: &str, setting_type: &SettingType) -> Result<()> {
        let conn = self.lock_conn()?;
        set_setting_on_conn(&conn, key, value, setting_type)
    }

    pub fn list_settings_impl(&self) -> Result<Vec<AppSetting>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {SETTING_COLUMNS} FROM app_settings ORDER BY setting_key");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], scan_setting)?;
        let mut settings = Vec::new();
        for row in rows {
            settings.push(row?);
        }
        Ok(settings)
    }
}
