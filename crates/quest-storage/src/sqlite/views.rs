//! Read-only derived views.

use rusqlite::params;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::tasks::{TASK_COLUMNS, scan_task};
use crate::traits::{EnrichedTask, UserSummary};

impl SqliteStore {
    /// One row of `v_user_summary`.
    pub fn get_user_summary_impl(&self, user_id: i64) -> Result<UserSummary> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT user_id, name, email, level, current_xp, total_xp_earned, current_streak,
                    longest_streak, tasks_completed, pending_tasks, badges_unlocked,
                    total_study_minutes
             FROM v_user_summary WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserSummary {
                    user_id: row.get("user_id")?,
                    name: row.get("name")?,
                    email: row.get("email")?,
                    level: row.get("level")?,
                    current_xp: row.get("current_xp")?,
                    total_xp_earned: row.get("total_xp_earned")?,
                    current_streak: row.get("current_streak")?,
                    longest_streak: row.get("longest_streak")?,
                    tasks_completed: row.get("tasks_completed")?,
                    pending_tasks: row.get("pending_tasks")?,
                    badges_unlocked: row.get("badges_unlocked")?,
                    total_study_minutes: row.get("total_study_minutes")?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("user", user_id),
            other => StorageError::Query(other),
        })
    }

    /// Rows of `v_tasks_enriched` for one user, by due date.
    pub fn list_enriched_tasks_impl(&self, user_id: i64) -> Result<Vec<EnrichedTask>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {TASK_COLUMNS}, is_overdue, days_until_due
             FROM v_tasks_enriched WHERE user_id = ?1 ORDER BY due_date, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(EnrichedTask {
                task: scan_task(row)?,
                is_overdue: row.get::<_, i32>("is_overdue")? != 0,
                days_until_due: row.get("days_until_due")?,
            })
        })?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use quest_core::enums::TaskStatus;
    use quest_core::session::NewSession;
    use quest_core::task::{TaskBuilder, TaskUpdates};
    use quest_core::user::NewUser;

    #[test]
    fn enriched_tasks_compute_due_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store
            .create_user_impl(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        let today = Utc::now().date_naive();
        let late = store
            .create_task_impl(
                &TaskBuilder::new(user.id, "Late")
                    .due_date(today - Duration::days(2))
                    .build(),
            )
            .unwrap();
        store
            .create_task_impl(
                &TaskBuilder::new(user.id, "Soon")
                    .due_date(today + Duration::days(3))
                    .build(),
            )
            .unwrap();
        let cancelled = store
            .create_task_impl(
                &TaskBuilder::new(user.id, "Dropped")
                    .due_date(today - Duration::days(5))
                    .build(),
            )
            .unwrap();
        store
            .update_task_impl(
                cancelled.id,
                &TaskUpdates {
                    status: Some(TaskStatus::Cancelled),
                    ..Default::default()
                },
            )
            .unwrap();

        let rows = store.list_enriched_tasks_impl(user.id).unwrap();
        assert_eq!(rows.len(), 3);
        let by_title = |t: &str| rows.iter().find(|r| r.task.title == t).unwrap();
        assert!(by_title("Late").is_overdue);
        assert_eq!(by_title("Late").days_until_due, -2);
        assert_eq!(by_title("Late").task.id, late.id);
        assert!(!by_title("Soon").is_overdue);
        assert_eq!(by_title("Soon").days_until_due, 3);
        assert!(!by_title("Dropped").is_overdue);
    }

    #[test]
    fn user_summary_counts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store
            .create_user_impl(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        store
            .create_task_impl(&TaskBuilder::new(user.id, "One").build())
            .unwrap();
        store
            .create_session_impl(&NewSession::new(user.id, "Algebra", 30))
            .unwrap();

        let summary = store.get_user_summary_impl(user.id).unwrap();
        assert_eq!(summary.name, "Ada");
        assert_eq!(summary.level, 1);
        assert_eq!(summary.pending_tasks, 1);
        assert_eq!(summary.badges_unlocked, 0);
        assert_eq!(summary.total_study_minutes, 0);
        assert!(store.get_user_summary_impl(999).unwrap_err().is_not_found());
    }
}
