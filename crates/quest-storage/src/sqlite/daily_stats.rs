//! Daily aggregate rows for [`SqliteStore`].

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

use quest_core::stats::{DailyStat, StatDelta};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::time::{DATE_FORMAT, format_date, get_date};

const STAT_COLUMNS: &str =
    "user_id, stat_date, tasks_completed, xp_earned, study_minutes, streak_active";

fn scan_stat(row: &Row<'_>) -> rusqlite::Result<DailyStat> {
    Ok(DailyStat {
        user_id: row.get("user_id")?,
        stat_date: get_date(row, "stat_date")?,
        tasks_completed: row.get("tasks_completed")?,
        xp_earned: row.get("xp_earned")?,
        study_minutes: row.get("study_minutes")?,
        streak_active: row.get::<_, i32>("streak_active")? != 0,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers (used by both SqliteStore and Transaction)
// ---------------------------------------------------------------------------

fn get_stat_on_conn(conn: &Connection, user_id: i64, date: NaiveDate) -> Result<DailyStat> {
    let sql = format!("SELECT {STAT_COLUMNS} FROM daily_stats WHERE user_id = ?1 AND stat_date = ?2");
    conn.query_row(&sql, params![user_id, format_date(date)], scan_stat)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StorageError::not_found("daily_stat", format!("{user_id}/{date}"))
            }
            other => StorageError::Query(other),
        })
}

/// Creates the (user, date) row at zero if needed and adds `delta` in one
/// statement. Negative deltas are rejected.
pub(crate) fn upsert_stat_on_conn(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
    delta: &StatDelta,
) -> Result<DailyStat> {
    if let Some((field, value)) = delta.negative_field() {
        return Err(StorageError::validation(format!(
            "daily stat delta {field} cannot be negative (got {value})"
        )));
    }
    conn.execute(
        "INSERT INTO daily_stats
             (user_id, stat_date, tasks_completed, xp_earned, study_minutes, streak_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id, stat_date) DO UPDATE SET
             tasks_completed = tasks_completed + excluded.tasks_completed,
             xp_earned       = xp_earned + excluded.xp_earned,
             study_minutes   = study_minutes + excluded.study_minutes,
             streak_active   = MAX(streak_active, excluded.streak_active)",
        params![
            user_id,
            format_date(date),
            delta.tasks_completed,
            delta.xp_earned,
            delta.study_minutes,
            delta.streak_active as i32,
        ],
    )?;
    get_stat_on_conn(conn, user_id, date)
}

pub(crate) fn last_stat_date_on_conn(conn: &Connection, user_id: i64) -> Result<Option<NaiveDate>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT MAX(stat_date) FROM daily_stats WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| StorageError::Internal(format!("malformed stat_date {s:?}: {e}")))
    })
    .transpose()
}

// ---------------------------------------------------------------------------
// SqliteStore daily stat methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn get_daily_stat_impl(&self, user_id: i64, date: NaiveDate) -> Result<DailyStat> {
        let conn = self.lock_conn()?;
        get_stat_on_conn(&conn, user_id, date)
    }

    pub fn list_daily_stats_impl(&self, user_id: i64, limit: i64) -> Result<Vec<DailyStat>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {STAT_COLUMNS} FROM daily_stats WHERE user_id = ?1
             ORDER BY stat_date DESC LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, limit.max(0)], scan_stat)?;
        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}
