//! Storage backend for the quest system.
//!
//! Provides the [`Storage`] trait and a SQLite implementation ([`SqliteStore`]).

pub mod error;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience.
pub use error::StorageError;
pub use sqlite::SqliteStore;
pub use traits::{
    EnrichedTask, Storage, Transaction, UserAggregates, UserBadge, UserSummary, transact,
};

// ---------------------------------------------------------------------------
// Storage trait implementation for SqliteStore
// ---------------------------------------------------------------------------

use chrono::NaiveDate;

use quest_core::activity::ActivityLogEntry;
use quest_core::badge::{Badge, NewBadge};
use quest_core::enums::{SessionStatus, SettingType};
use quest_core::filter::TaskFilter;
use quest_core::session::{NewSession, StudySession};
use quest_core::setting::AppSetting;
use quest_core::stats::DailyStat;
use quest_core::task::{NewTask, Task, TaskUpdates};
use quest_core::user::{NewUser, User};

use crate::error::Result;

impl Storage for SqliteStore {
    fn create_user(&self, user: &NewUser) -> Result<User> {
        self.create_user_impl(user)
    }

    fn get_user(&self, id: i64) -> Result<User> {
        self.get_user_impl(id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.get_user_by_email_impl(email)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.list_users_impl()
    }

    fn delete_user(&self, id: i64) -> Result<()> {
        self.delete_user_impl(id)
    }

    fn create_task(&self, task: &NewTask) -> Result<Task> {
        self.create_task_impl(task)
    }

    fn get_task(&self, id: i64) -> Result<Task> {
        self.get_task_impl(id)
    }

    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.list_tasks_impl(filter)
    }

    fn update_task(&self, id: i64, updates: &TaskUpdates) -> Result<Task> {
        self.update_task_impl(id, updates)
    }

    fn delete_task(&self, id: i64) -> Result<()> {
        self.delete_task_impl(id)
    }

    fn create_session(&self, session: &NewSession) -> Result<StudySession> {
        self.create_session_impl(session)
    }

    fn get_session(&self, id: i64) -> Result<StudySession> {
        self.get_session_impl(id)
    }

    fn list_sessions(&self, user_id: i64) -> Result<Vec<StudySession>> {
        self.list_sessions_impl(user_id)
    }

    fn update_session_status(&self, id: i64, status: &SessionStatus) -> Result<StudySession> {
        self.update_session_status_impl(id, status)
    }

    fn create_badge(&self, badge: &NewBadge) -> Result<Badge> {
        self.create_badge_impl(badge)
    }

    fn get_badge(&self, id: i64) -> Result<Badge> {
        self.get_badge_impl(id)
    }

    fn get_badge_by_key(&self, key: &str) -> Result<Badge> {
        self.get_badge_by_key_impl(key)
    }

    fn list_badges(&self, active_only: bool) -> Result<Vec<Badge>> {
        self.list_badges_impl(active_only)
    }

    fn set_badge_active(&self, key: &str, active: bool) -> Result<Badge> {
        self.set_badge_active_impl(key, active)
    }

    fn seed_default_badges(&self) -> Result<usize> {
        self.seed_default_badges_impl()
    }

    fn list_user_badges(&self, user_id: i64) -> Result<Vec<UserBadge>> {
        self.list_user_badges_impl(user_id)
    }

    fn get_daily_stat(&self, user_id: i64, date: NaiveDate) -> Result<DailyStat> {
        self.get_daily_stat_impl(user_id, date)
    }

    fn list_daily_stats(&self, user_id: i64, limit: i64) -> Result<Vec<DailyStat>> {
        self.list_daily_stats_impl(user_id, limit)
    }

    fn list_activity(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        self.list_activity_impl(user_id, limit)
    }

    fn get_setting(&self, key: &str) -> Result<AppSetting> {
        self.get_setting_impl(key)
    }

    fn set_setting(&self, key: &str, value: &str, setting_type: &SettingType) -> Result<()> {
        self.set_setting_impl(key, value, setting_type)
    }

    fn list_settings(&self) -> Result<Vec<AppSetting>> {
        self.list_settings_impl()
    }

    fn get_user_summary(&self, user_id: i64) -> Result<UserSummary> {
        self.get_user_summary_impl(user_id)
    }

    fn list_enriched_tasks(&self, user_id: i64) -> Result<Vec<EnrichedTask>> {
        self.list_enriched_tasks_impl(user_id)
    }

    fn run_in_transaction(
        &self,
        f: &mut dyn FnMut(&dyn Transaction) -> Result<()>,
    ) -> Result<()> {
        self.run_in_transaction_impl(f)
    }

    fn close(&self) -> Result<()> {
        // The connection closes when the store is dropped.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transact_returns_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store
            .create_user(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        let name: String =
            transact::<_, StorageError, _>(&store, |tx| Ok(tx.get_user(user.id)?.name)).unwrap();
        assert_eq!(name, "Ada");
    }

    #[test]
    fn transact_hands_back_body_error() {
        #[derive(Debug, PartialEq)]
        enum BodyError {
            Nope,
            Store,
        }
        impl From<StorageError> for BodyError {
            fn from(_: StorageError) -> Self {
                BodyError::Store
            }
        }

        let store = SqliteStore::open_in_memory().unwrap();
        let err = transact::<(), _, _>(&store, |_tx| Err(BodyError::Nope)).unwrap_err();
        assert_eq!(err, BodyError::Nope);
        let err = transact::<(), BodyError, _>(&store, |tx| {
            tx.get_user(42)?;
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err, BodyError::Store);
    }
}
