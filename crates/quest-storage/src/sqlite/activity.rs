//! Append-only activity log for [`SqliteStore`].
//!
//! There is deliberately no update or delete path: entries disappear only
//! with their owning user.

use rusqlite::{Connection, Row, params};

use quest_core::activity::{ActivityLogEntry, NewActivity};
use quest_core::enums::ActivityType;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::time::{format_datetime, get_datetime};

const ACTIVITY_COLUMNS: &str = "id, user_id, activity_type, entity_type, entity_id, description, \
     xp_change, metadata_json, created_at";

fn scan_activity(row: &Row<'_>) -> rusqlite::Result<ActivityLogEntry> {
    let metadata_str: Option<String> = row.get("metadata_json")?;
    // Unparseable metadata is dropped rather than failing the whole read.
    let metadata = metadata_str
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| serde_json::from_str(s).ok());
    Ok(ActivityLogEntry {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        activity_type: ActivityType::from(row.get::<_, String>("activity_type")?),
        entity_type: row.get("entity_type")?,
        entity_id: row.get("entity_id")?,
        description: row.get("description")?,
        xp_change: row.get("xp_change")?,
        metadata,
        created_at: get_datetime(row, "created_at")?,
    })
}

pub(crate) fn insert_activity(conn: &Connection, entry: &NewActivity) -> Result<ActivityLogEntry> {
    let metadata = entry
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO activity_log (user_id, activity_type, entity_type, entity_id, description,
                                   xp_change, metadata_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.user_id,
            entry.activity_type.as_str(),
            entry.entity_type,
            entry.entity_id,
            entry.description,
            entry.xp_change,
            metadata,
            format_datetime(&entry.created_at),
        ],
    )?;
    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activity_log WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_activity)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("activity", id),
            other => StorageError::Query(other),
        })
}

impl SqliteStore {
    /// Lists a user's entries, newest first.
    pub fn list_activity_impl(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_log WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, limit.max(0)], scan_activity)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}
