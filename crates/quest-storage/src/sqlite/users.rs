//! User CRUD and aggregate writes for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use quest_core::user::{NewUser, User};
use quest_core::validation::validate_new_user;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::time::{format_datetime, get_datetime};
use crate::traits::UserAggregates;

pub(crate) const USER_COLUMNS: &str = "id, uuid, name, email, current_xp, level, current_streak, \
     longest_streak, tasks_completed, total_xp_earned, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

pub(crate) fn scan_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        email: row.get("email")?,
        current_xp: row.get("current_xp")?,
        level: row.get("level")?,
        current_streak: row.get("current_streak")?,
        longest_streak: row.get("longest_streak")?,
        tasks_completed: row.get("tasks_completed")?,
        total_xp_earned: row.get("total_xp_earned")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers (used by both SqliteStore and Transaction)
// ---------------------------------------------------------------------------

/// Inserts a user and one progress row per active badge.
pub(crate) fn insert_user(conn: &Connection, user: &NewUser) -> Result<User> {
    validate_new_user(user)?;
    let now = format_datetime(&Utc::now());
    let uuid = uuid::Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO users (uuid, name, email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![uuid, user.name.trim(), user.email.trim(), now],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StorageError::validation(format!("email already registered: {}", user.email.trim()))
        }
        other => StorageError::Query(other),
    })?;
    let id = conn.last_insert_rowid();

    let badges = conn.execute(
        "INSERT OR IGNORE INTO user_badges (user_id, badge_id, progress, is_unlocked)
         SELECT ?1, id, 0, 0 FROM badges WHERE is_active = 1",
        params![id],
    )?;
    debug!(user_id = id, badges, "created user");

    get_user_on_conn(conn, id)
}

pub(crate) fn get_user_on_conn(conn: &Connection, id: i64) -> Result<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_user)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("user", id),
            other => StorageError::Query(other),
        })
}

pub(crate) fn update_aggregates_on_conn(
    conn: &Connection,
    user_id: i64,
    agg: &UserAggregates,
) -> Result<()> {
    let affected = conn.execute(
        "UPDATE users SET current_xp = ?1, level = ?2, current_streak = ?3,
             longest_streak = ?4, tasks_completed = ?5, total_xp_earned = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            agg.current_xp,
            agg.level,
            agg.current_streak,
            agg.longest_streak,
            agg.tasks_completed,
            agg.total_xp_earned,
            format_datetime(&Utc::now()),
            user_id,
        ],
    )?;
    if affected == 0 {
        return Err(StorageError::not_found("user", user_id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteStore user methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Registers a user.
    pub fn create_user_impl(&self, user: &NewUser) -> Result<User> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        let created = insert_user(&tx, user)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(created)
    }

    pub fn get_user_impl(&self, id: i64) -> Result<User> {
        let conn = self.lock_conn()?;
        get_user_on_conn(&conn, id)
    }

    pub fn get_user_by_email_impl(&self, email: &str) -> Result<User> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        conn.query_row(&sql, params![email.trim()], scan_user)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StorageError::not_found("user", format!("email={email}"))
                }
                other => StorageError::Query(other),
            })
    }

    pub fn list_users_impl(&self) -> Result<Vec<User>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], scan_user)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Deletes a user; owned rows go with it through `ON DELETE CASCADE`.
    pub fn delete_user_impl(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::not_found("user", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn create_and_get_user() {
        let store = test_store();
        let user = store
            .create_user_impl(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.level, 1);
        assert_eq!(user.current_xp, 0);
        assert_eq!(user.current_streak, 0);
        assert_eq!(user.uuid.len(), 36);

        let got = store.get_user_impl(user.id).unwrap();
        assert_eq!(got, user);
        let by_email = store.get_user_by_email_impl("ada@example.com").unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[test]
    fn duplicate_email_is_validation_error() {
        let store = test_store();
        store
            .create_user_impl(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        let err = store
            .create_user_impl(&NewUser::new("Other", "ada@example.com"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));
    }

    #[test]
    fn invalid_user_rejected() {
        let store = test_store();
        let err = store.create_user_impl(&NewUser::new("", "x@y.z")).unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));
    }

    #[test]
    fn progress_rows_created_for_active_badges() {
        let store = test_store();
        store.seed_default_badges_impl().unwrap();
        store.set_badge_active_impl("TASK_50", false).unwrap();
        let user = store
            .create_user_impl(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        let conn = store.lock_conn().unwrap();
        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM user_badges WHERE user_id = ?1",
                params![user.id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(rows, 5);
    }

    #[test]
    fn delete_user_not_found() {
        let store = test_store();
        assert!(store.delete_user_impl(99).unwrap_err().is_not_found());
    }

    #[test]
    fn list_users_in_id_order() {
        let store = test_store();
        store.create_user_impl(&NewUser::new("A", "a@example.com")).unwrap();
        store.create_user_impl(&NewUser::new("B", "b@example.com")).unwrap();
        let names: Vec<String> = store
            .list_users_impl()
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
