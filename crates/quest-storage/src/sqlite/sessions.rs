//! Study session operations for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, Row, params};

use quest_core::enums::SessionStatus;
use quest_core::session::{NewSession, StudySession};
use quest_core::validation::validate_new_session;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::time::{format_datetime, get_datetime, get_opt_datetime};

pub(crate) const SESSION_COLUMNS: &str = "id, uuid, user_id, subject, description, scheduled_at, \
     duration_minutes, status, xp_earned, notes, completed_at, created_at, updated_at";

pub(crate) fn scan_session(row: &Row<'_>) -> rusqlite::Result<StudySession> {
    Ok(StudySession {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        user_id: row.get("user_id")?,
        subject: row.get("subject")?,
        description: row.get("description")?,
        scheduled_at: get_datetime(row, "scheduled_at")?,
        duration_minutes: row.get("duration_minutes")?,
        status: SessionStatus::from(row.get::<_, String>("status")?),
        xp_earned: row.get("xp_earned")?,
        notes: row.get("notes")?,
        completed_at: get_opt_datetime(row, "completed_at")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers (used by both SqliteStore and Transaction)
// ---------------------------------------------------------------------------

pub(crate) fn insert_session(conn: &Connection, session: &NewSession) -> Result<StudySession> {
    validate_new_session(session)?;
    let now = format_datetime(&Utc::now());
    conn.execute(
        "INSERT INTO study_sessions (uuid, user_id, subject, description, scheduled_at,
                                     duration_minutes, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'SCHEDULED', ?7, ?7)",
        params![
            uuid::Uuid::new_v4().to_string(),
            session.user_id,
            session.subject.trim(),
            session.description,
            format_datetime(&session.scheduled_at),
            session.duration_minutes,
            now,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            StorageError::not_found("user", session.user_id)
        }
        other => StorageError::Query(other),
    })?;
    get_session_on_conn(conn, conn.last_insert_rowid())
}

pub(crate) fn get_session_on_conn(conn: &Connection, id: i64) -> Result<StudySession> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_session)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("session", id),
            other => StorageError::Query(other),
        })
}

/// Compare-and-swap transition to COMPLETED.
pub(crate) fn complete_session_if_open_on_conn(
    conn: &Connection,
    user_id: i64,
    session_id: i64,
    xp_earned: i64,
    at: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE study_sessions
            SET status = 'COMPLETED', xp_earned = ?1, completed_at = ?2, updated_at = ?2
         WHERE id = ?3 AND user_id = ?4 AND status IN ('SCHEDULED', 'IN_PROGRESS')",
        params![xp_earned, at, session_id, user_id],
    )?;
    Ok(affected == 1)
}

pub(crate) fn count_completed_sessions_on_conn(conn: &Connection, user_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM study_sessions WHERE user_id = ?1 AND status = 'COMPLETED'",
        params![user_id],
        |row| row.get(0),
    )?)
}

pub(crate) fn sum_completed_minutes_on_conn(conn: &Connection, user_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(duration_minutes), 0) FROM study_sessions
         WHERE user_id = ?1 AND status = 'COMPLETED'",
        params![user_id],
        |row| row.get(0),
    )?)
}

// ---------------------------------------------------------------------------
// SqliteStore session methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn create_session_impl(&self, session: &NewSession) -> Result<StudySession> {
        let conn = self.lock_conn()?;
        insert_session(&conn, session)
    }

    pub fn get_session_impl(&self, id: i64) -> Result<StudySession> {
        let conn = self.lock_conn()?;
        get_session_on_conn(&conn, id)
    }

    pub fn list_sessions_impl(&self, user_id: i64) -> Result<Vec<StudySession>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE user_id = ?1
             ORDER BY scheduled_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], scan_session)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    /// Moves a session between SCHEDULED, IN_PROGRESS, CANCELLED, and MISSED.
    pub fn update_session_status_impl(
        &self,
        id: i64,
        status: &SessionStatus,
    ) -> Result<StudySession> {
        let conn = self.lock_conn()?;
        let current = get_session_on_conn(&conn, id)?;
        if !status.is_builtin()
            || *status == SessionStatus::Completed
            || current.status == SessionStatus::Completed
        {
            return Err(StorageError::invalid_transition(
                "session",
                id,
                current.status.as_str(),
                status.as_str(),
            ));
        }
        conn.execute(
            "UPDATE study_sessions SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_datetime(&Utc::now()), id],
        )?;
        get_session_on_conn(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::user::NewUser;

    fn setup() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store
            .create_user_impl(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        (store, user.id)
    }

    #[test]
    fn create_and_list_sessions() {
        let (store, uid) = setup();
        let at = "2024-05-10T09:00:00Z".parse().unwrap();
        let session = store
            .create_session_impl(&NewSession::new(uid, "Algebra", 45).scheduled_at(at))
            .unwrap();
        assert_eq!(session.status, SessionStatus::Scheduled);
        assert_eq!(session.xp_earned, 0);
        assert_eq!(session.scheduled_at, at);

        let listed = store.list_sessions_impl(uid).unwrap();
        assert_eq!(listed, vec![session]);
    }

    #[test]
    fn zero_duration_rejected() {
        let (store, uid) = setup();
        let err = store
            .create_session_impl(&NewSession::new(uid, "Algebra", 0))
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));
    }

    #[test]
    fn status_updates_cannot_complete() {
        let (store, uid) = setup();
        let session = store
            .create_session_impl(&NewSession::new(uid, "History", 30))
            .unwrap();
        let moved = store
            .update_session_status_impl(session.id, &SessionStatus::InProgress)
            .unwrap();
        assert_eq!(moved.status, SessionStatus::InProgress);

        let err = store
            .update_session_status_impl(session.id, &SessionStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidTransition { .. }));
    }

    #[test]
    fn completed_minutes_sum() {
        let (store, uid) = setup();
        let a = store.create_session_impl(&NewSession::new(uid, "A", 30)).unwrap();
        store.create_session_impl(&NewSession::new(uid, "B", 20)).unwrap();
        let conn = store.lock_conn().unwrap();
        let at = format_datetime(&Utc::now());
        assert!(complete_session_if_open_on_conn(&conn, uid, a.id, 30, &at).unwrap());
        assert_eq!(count_completed_sessions_on_conn(&conn, uid).unwrap(), 1);
        assert_eq!(sum_completed_minutes_on_conn(&conn, uid).unwrap(), 30);
    }
}
