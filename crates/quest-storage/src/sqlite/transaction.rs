//! Transaction wrapper for [`SqliteStore`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};

use quest_core::activity::{ActivityLogEntry, NewActivity};
use quest_core::badge::{Badge, BadgeProgress};
use quest_core::enums::TaskCategory;
use quest_core::session::StudySession;
use quest_core::stats::{DailyStat, StatDelta};
use quest_core::task::Task;
use quest_core::user::User;

use crate::error::{Result, StorageError};
use crate::sqlite::activity;
use crate::sqlite::badges;
use crate::sqlite::daily_stats;
use crate::sqlite::sessions;
use crate::sqlite::settings;
use crate::sqlite::store::SqliteStore;
use crate::sqlite::tasks;
use crate::sqlite::time::format_datetime;
use crate::sqlite::users;
use crate::traits::{Transaction, UserAggregates};

/// A thin wrapper around a SQLite connection that is inside a transaction.
///
/// The connection already holds `BEGIN IMMEDIATE`, so every read here sees
/// the same snapshot the writes will commit against.
pub(crate) struct SqliteTx<'a> {
    pub(crate) conn: &'a Connection,
}

impl Transaction for SqliteTx<'_> {
    fn get_user(&self, id: i64) -> Result<User> {
        users::get_user_on_conn(self.conn, id)
    }

    fn get_task(&self, id: i64) -> Result<Task> {
        tasks::get_task_on_conn(self.conn, id)
    }

    fn get_session(&self, id: i64) -> Result<StudySession> {
        sessions::get_session_on_conn(self.conn, id)
    }

    fn list_active_badges(&self) -> Result<Vec<Badge>> {
        badges::list_badges_on_conn(self.conn, true)
    }

    fn get_badge_progress(&self, user_id: i64, badge_id: i64) -> Result<Option<BadgeProgress>> {
        badges::get_progress_on_conn(self.conn, user_id, badge_id)
    }

    fn count_completed_tasks(&self, user_id: i64, category: Option<&TaskCategory>) -> Result<i64> {
        tasks::count_completed_tasks_on_conn(self.conn, user_id, category)
    }

    fn count_completed_sessions(&self, user_id: i64) -> Result<i64> {
        sessions::count_completed_sessions_on_conn(self.conn, user_id)
    }

    fn sum_completed_study_minutes(&self, user_id: i64) -> Result<i64> {
        sessions::sum_completed_minutes_on_conn(self.conn, user_id)
    }

    fn last_qualifying_day(&self, user_id: i64) -> Result<Option<NaiveDate>> {
        daily_stats::last_stat_date_on_conn(self.conn, user_id)
    }

    fn get_settings(&self) -> Result<HashMap<String, String>> {
        settings::get_all_settings_on_conn(self.conn)
    }

    fn complete_task_if_open(
        &self,
        user_id: i64,
        task_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        tasks::complete_task_if_open_on_conn(self.conn, user_id, task_id, &format_datetime(&at))
    }

    fn complete_session_if_open(
        &self,
        user_id: i64,
        session_id: i64,
        xp_earned: i64,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        sessions::complete_session_if_open_on_conn(
            self.conn,
            user_id,
            session_id,
            xp_earned,
            &format_datetime(&at),
        )
    }

    fn update_user_aggregates(&self, user_id: i64, aggregates: &UserAggregates) -> Result<()> {
        users::update_aggregates_on_conn(self.conn, user_id, aggregates)
    }

    fn raise_badge_progress(
        &self,
        user_id: i64,
        badge_id: i64,
        progress: i64,
    ) -> Result<BadgeProgress> {
        badges::raise_progress_on_conn(self.conn, user_id, badge_id, progress)
    }

    fn unlock_badge(&self, user_id: i64, badge_id: i64, at: DateTime<Utc>) -> Result<bool> {
        badges::unlock_on_conn(self.conn, user_id, badge_id, &format_datetime(&at))
    }

    fn upsert_daily_stat(
        &self,
        user_id: i64,
        date: NaiveDate,
        delta: &StatDelta,
    ) -> Result<DailyStat> {
        daily_stats::upsert_stat_on_conn(self.conn, user_id, date, delta)
    }

    fn record_activity(&self, entry: &NewActivity) -> Result<ActivityLogEntry> {
        activity::insert_activity(self.conn, entry)
    }
}

// ---------------------------------------------------------------------------
// SqliteStore::run_in_transaction
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Runs a closure inside an immediate write transaction.
    ///
    /// The write lock is taken at `BEGIN`, so two stores racing on the same
    /// file serialize here (bounded by `busy_timeout`) instead of failing at
    /// the first write.
    pub fn run_in_transaction_impl(
        &self,
        f: &mut dyn FnMut(&dyn Transaction) -> Result<()>,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = rusqlite::Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, msg)
                    if matches!(
                        err.code,
                        rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                    ) =>
                {
                    StorageError::DatabaseLocked(msg.unwrap_or_else(|| err.to_string()))
                }
                other => StorageError::Transaction(format!("failed to begin: {other}")),
            })?;

        let sqlite_tx = SqliteTx { conn: &tx };
        match f(&sqlite_tx) {
            Ok(()) => {
                tx.commit()
                    .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
                Ok(())
            }
            Err(e) => {
                // Transaction is rolled back on drop.
                Err(e)
            }
        }
    }
}
