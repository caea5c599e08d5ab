//! Badge catalog and per-user progress operations for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use quest_core::badge::{Badge, BadgeProgress, NewBadge, default_catalog};
use quest_core::enums::{RequirementType, TaskCategory};
use quest_core::validation::validate_new_badge;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::time::{format_datetime, get_datetime, get_opt_datetime};
use crate::traits::UserBadge;

pub(crate) const BADGE_COLUMNS: &str = "id, badge_key, name, description, icon_name, \
     requirement_type, requirement_value, requirement_category, xp_bonus, is_active, created_at";

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

pub(crate) fn scan_badge(row: &Row<'_>) -> rusqlite::Result<Badge> {
    let category: Option<String> = row.get("requirement_category")?;
    Ok(Badge {
        id: row.get("id")?,
        badge_key: row.get("badge_key")?,
        name: row.get("name")?,
        description: row.get("description")?,
        icon_name: row.get("icon_name")?,
        requirement_type: RequirementType::from(row.get::<_, String>("requirement_type")?),
        requirement_value: row.get("requirement_value")?,
        requirement_category: category.filter(|c| !c.is_empty()).map(TaskCategory::from),
        xp_bonus: row.get("xp_bonus")?,
        is_active: row.get::<_, i32>("is_active")? != 0,
        created_at: get_datetime(row, "created_at")?,
    })
}

fn scan_progress(row: &Row<'_>) -> rusqlite::Result<BadgeProgress> {
    Ok(BadgeProgress {
        user_id: row.get("user_id")?,
        badge_id: row.get("badge_id")?,
        progress: row.get("progress")?,
        is_unlocked: row.get::<_, i32>("is_unlocked")? != 0,
        unlocked_at: get_opt_datetime(row, "unlocked_at")?,
    })
}

// ---------------------------------------------------------------------------
// Catalog helpers
// ---------------------------------------------------------------------------

/// Inserts a badge unless its key exists. Returns `None` when skipped.
fn insert_badge_if_absent(conn: &Connection, badge: &NewBadge) -> Result<Option<i64>> {
    validate_new_badge(badge)?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO badges (badge_key, name, description, icon_name, requirement_type,
                                       requirement_value, requirement_category, xp_bonus,
                                       is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
        params![
            badge.badge_key.trim(),
            badge.name,
            badge.description,
            badge.icon_name,
            badge.requirement_type.as_str(),
            badge.requirement_value,
            badge.requirement_category.as_ref().map(|c| c.as_str().to_string()),
            badge.xp_bonus,
            format_datetime(&Utc::now()),
        ],
    )?;
    if inserted == 0 {
        return Ok(None);
    }
    let id = conn.last_insert_rowid();
    // Existing users start at zero progress on the new badge.
    conn.execute(
        "INSERT OR IGNORE INTO user_badges (user_id, badge_id, progress, is_unlocked)
         SELECT id, ?1, 0, 0 FROM users",
        params![id],
    )?;
    Ok(Some(id))
}

pub(crate) fn get_badge_on_conn(conn: &Connection, id: i64) -> Result<Badge> {
    let sql = format!("SELECT {BADGE_COLUMNS} FROM badges WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_badge)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("badge", id),
            other => StorageError::Query(other),
        })
}

fn get_badge_by_key_on_conn(conn: &Connection, key: &str) -> Result<Badge> {
    let sql = format!("SELECT {BADGE_COLUMNS} FROM badges WHERE badge_key = ?1");
    conn.query_row(&sql, params![key], scan_badge)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("badge", key),
            other => StorageError::Query(other),
        })
}

pub(crate) fn list_badges_on_conn(conn: &Connection, active_only: bool) -> Result<Vec<Badge>> {
    let sql = if active_only {
        format!("SELECT {BADGE_COLUMNS} FROM badges WHERE is_active = 1 ORDER BY id")
    } else {
        format!("SELECT {BADGE_COLUMNS} FROM badges ORDER BY id")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], scan_badge)?;
    let mut badges = Vec::new();
    for row in rows {
        badges.push(row?);
    }
    Ok(badges)
}

// ---------------------------------------------------------------------------
// Progress helpers (engine-owned)
// ---------------------------------------------------------------------------

pub(crate) fn get_progress_on_conn(
    conn: &Connection,
    user_id: i64,
    badge_id: i64,
) -> Result<Option<BadgeProgress>> {
    Ok(conn
        .query_row(
            "SELECT user_id, badge_id, progress, is_unlocked, unlocked_at
             FROM user_badges WHERE user_id = ?1 AND badge_id = ?2",
            params![user_id, badge_id],
            scan_progress,
        )
        .optional()?)
}

/// Stores `max(old, progress)`, creating the row at zero if it is missing.
pub(crate) fn raise_progress_on_conn(
    conn: &Connection,
    user_id: i64,
    badge_id: i64,
    progress: i64,
) -> Result<BadgeProgress> {
    conn.execute(
        "INSERT INTO user_badges (user_id, badge_id, progress, is_unlocked)
         VALUES (?1, ?2, MAX(?3, 0), 0)
         ON CONFLICT(user_id, badge_id) DO UPDATE SET progress = MAX(progress, excluded.progress)",
        params![user_id, badge_id, progress],
    )?;
    get_progress_on_conn(conn, user_id, badge_id)?
        .ok_or_else(|| StorageError::not_found("user_badge", format!("{user_id}/{badge_id}")))
}

/// One-way unlock guarded by `is_unlocked = 0`.
pub(crate) fn unlock_on_conn(conn: &Connection, user_id: i64, badge_id: i64, at: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE user_badges SET is_unlocked = 1, unlocked_at = ?1
         WHERE user_id = ?2 AND badge_id = ?3 AND is_unlocked = 0",
        params![at, user_id, badge_id],
    )?;
    Ok(affected == 1)
}

// ---------------------------------------------------------------------------
// SqliteStore badge methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn create_badge_impl(&self, badge: &NewBadge) -> Result<Badge> {
        let conn = self.lock_conn()?;
        match insert_badge_if_absent(&conn, badge)? {
            Some(id) => get_badge_on_conn(&conn, id),
            None => Err(StorageError::validation(format!(
                "badge key already exists: {}",
                badge.badge_key
            ))),
        }
    }

    pub fn get_badge_impl(&self, id: i64) -> Result<Badge> {
        let conn = self.lock_conn()?;
        get_badge_on_conn(&conn, id)
    }

    pub fn get_badge_by_key_impl(&self, key: &str) -> Result<Badge> {
        let conn = self.lock_conn()?;
        get_badge_by_key_on_conn(&conn, key)
    }

    pub fn list_badges_impl(&self, active_only: bool) -> Result<Vec<Badge>> {
        let conn = self.lock_conn()?;
        list_badges_on_conn(&conn, active_only)
    }

    /// Toggles whether a badge takes part in evaluation. Unlocked progress
    /// is kept either way.
    pub fn set_badge_active_impl(&self, key: &str, active: bool) -> Result<Badge> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "UPDATE badges SET is_active = ?1 WHERE badge_key = ?2",
            params![active as i32, key],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("badge", key));
        }
        debug!(key, active, "badge activity toggled");
        get_badge_by_key_on_conn(&conn, key)
    }

    pub fn seed_default_badges_impl(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        let mut inserted = 0;
        for badge in default_catalog() {
            if insert_badge_if_absent(&tx, &badge)?.is_some() {
                inserted += 1;
            }
        }
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        info!(inserted, "seeded default badges");
        Ok(inserted)
    }

    /// Every catalog badge with the user's progress; badges without a
    /// progress row report zero.
    pub fn list_user_badges_impl(&self, user_id: i64) -> Result<Vec<UserBadge>> {
        let conn = self.lock_conn()?;
        // Surface NotFound for unknown users instead of an empty list.
        crate::sqlite::users::get_user_on_conn(&conn, user_id)?;

        let sql = format!(
            "SELECT {cols},
                    COALESCE(ub.progress, 0) AS progress,
                    COALESCE(ub.is_unlocked, 0) AS is_unlocked,
                    ub.unlocked_at AS unlocked_at
             FROM badges b
             LEFT JOIN user_badges ub ON ub.badge_id = b.id AND ub.user_id = ?1
             ORDER BY b.id",
            cols = BADGE_COLUMNS
                .split(", ")
                .map(|c| format!("b.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(UserBadge {
                badge: scan_badge(row)?,
                progress: row.get("progress")?,
                is_unlocked: row.get::<_, i32>("is_unlocked")? != 0,
                unlocked_at: get_opt_datetime(row, "unlocked_at")?,
            })
        })?;
        let mut badges = Vec::new();
        for row in rows {
            badges.push(row?);
        }
        Ok(badges)
    }
}
