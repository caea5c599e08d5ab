//! Storage and Transaction traits -- the public API for quest persistence.
//!
//! [`Storage`] is the entity CRUD surface for external tools. It never writes
//! engine-owned fields. [`Transaction`] is what the completion engine sees
//! inside one atomic unit of work, including the aggregate writes.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use quest_core::activity::{ActivityLogEntry, NewActivity};
use quest_core::badge::{Badge, BadgeProgress, NewBadge};
use quest_core::enums::{SessionStatus, SettingType, TaskCategory};
use quest_core::filter::TaskFilter;
use quest_core::session::{NewSession, StudySession};
use quest_core::setting::AppSetting;
use quest_core::stats::{DailyStat, StatDelta};
use quest_core::task::{NewTask, Task, TaskUpdates};
use quest_core::user::{NewUser, User};

use crate::error::{Result, StorageError};

// ---------------------------------------------------------------------------
// View / helper types
// ---------------------------------------------------------------------------

/// Engine-owned user aggregates, written as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAggregates {
    pub current_xp: i64,
    pub level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub tasks_completed: i64,
    pub total_xp_earned: i64,
}

impl From<&User> for UserAggregates {
    fn from(user: &User) -> Self {
        Self {
            current_xp: user.current_xp,
            level: user.level,
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            tasks_completed: user.tasks_completed,
            total_xp_earned: user.total_xp_earned,
        }
    }
}

/// A catalog badge joined with one user's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub badge: Badge,
    pub progress: i64,
    pub is_unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// A row of the `v_user_summary` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub level: i32,
    pub current_xp: i64,
    pub total_xp_earned: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub tasks_completed: i64,
    pub pending_tasks: i64,
    pub badges_unlocked: i64,
    pub total_study_minutes: i64,
}

/// A row of the `v_tasks_enriched` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedTask {
    #[serde(flatten)]
    pub task: Task,
    pub is_overdue: bool,
    /// Negative once the due date has passed.
    pub days_until_due: i64,
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Primary storage interface.
///
/// All methods return [`Result`] to propagate [`StorageError`]s.
pub trait Storage: Send + Sync {
    // -- Users ---------------------------------------------------------------

    /// Registers a user and creates progress rows for every active badge.
    fn create_user(&self, user: &NewUser) -> Result<User>;

    fn get_user(&self, id: i64) -> Result<User>;

    fn get_user_by_email(&self, email: &str) -> Result<User>;

    fn list_users(&self) -> Result<Vec<User>>;

    /// Deletes a user and everything it owns.
    fn delete_user(&self, id: i64) -> Result<()>;

    // -- Tasks ---------------------------------------------------------------

    /// Creates a task and records a TASK_CREATED entry.
    fn create_task(&self, task: &NewTask) -> Result<Task>;

    fn get_task(&self, id: i64) -> Result<Task>;

    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    /// Applies partial updates. Never completes a task.
    fn update_task(&self, id: i64, updates: &TaskUpdates) -> Result<Task>;

    /// Deletes a task and records a TASK_DELETED entry.
    fn delete_task(&self, id: i64) -> Result<()>;

    // -- Study sessions ------------------------------------------------------

    fn create_session(&self, session: &NewSession) -> Result<StudySession>;

    fn get_session(&self, id: i64) -> Result<StudySession>;

    fn list_sessions(&self, user_id: i64) -> Result<Vec<StudySession>>;

    /// Moves a session between non-completed states.
    fn update_session_status(&self, id: i64, status: &SessionStatus) -> Result<StudySession>;

    // -- Badge catalog -------------------------------------------------------

    fn create_badge(&self, badge: &NewBadge) -> Result<Badge>;

    fn get_badge(&self, id: i64) -> Result<Badge>;

    fn get_badge_by_key(&self, key: &str) -> Result<Badge>;

    fn list_badges(&self, active_only: bool) -> Result<Vec<Badge>>;

    fn set_badge_active(&self, key: &str, active: bool) -> Result<Badge>;

    /// Inserts the starter catalog, skipping keys that already exist.
    /// Returns the number of badges inserted.
    fn seed_default_badges(&self) -> Result<usize>;

    /// Every catalog badge joined with the user's progress.
    fn list_user_badges(&self, user_id: i64) -> Result<Vec<UserBadge>>;

    // -- Daily stats ---------------------------------------------------------

    fn get_daily_stat(&self, user_id: i64, date: NaiveDate) -> Result<DailyStat>;

    /// Most recent days first.
    fn list_daily_stats(&self, user_id: i64, limit: i64) -> Result<Vec<DailyStat>>;

    // -- Activity log --------------------------------------------------------

    /// Newest entries first.
    fn list_activity(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>>;

    // -- Settings ------------------------------------------------------------

    fn get_setting(&self, key: &str) -> Result<AppSetting>;

    /// Validates `value` against `setting_type` and upserts it.
    fn set_setting(&self, key: &str, value: &str, setting_type: &SettingType) -> Result<()>;

    fn list_settings(&self) -> Result<Vec<AppSetting>>;

    // -- Views ---------------------------------------------------------------

    fn get_user_summary(&self, user_id: i64) -> Result<UserSummary>;

    fn list_enriched_tasks(&self, user_id: i64) -> Result<Vec<EnrichedTask>>;

    // -- Transactions --------------------------------------------------------

    /// Runs `f` inside one write transaction. Commits if `f` returns `Ok`,
    /// rolls back otherwise.
    fn run_in_transaction(&self, f: &mut dyn FnMut(&dyn Transaction) -> Result<()>)
    -> Result<()>;

    // -- Lifecycle -----------------------------------------------------------

    /// Closes the storage backend.
    fn close(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Transaction trait
// ---------------------------------------------------------------------------

/// Operations available inside a transaction.
///
/// This is the only place engine-owned fields can be written.
pub trait Transaction {
    // -- Reads ---------------------------------------------------------------

    fn get_user(&self, id: i64) -> Result<User>;

    fn get_task(&self, id: i64) -> Result<Task>;

    fn get_session(&self, id: i64) -> Result<StudySession>;

    /// Every active badge, ascending by id.
    fn list_active_badges(&self) -> Result<Vec<Badge>>;

    fn get_badge_progress(&self, user_id: i64, badge_id: i64) -> Result<Option<BadgeProgress>>;

    fn count_completed_tasks(&self, user_id: i64, category: Option<&TaskCategory>) -> Result<i64>;

    fn count_completed_sessions(&self, user_id: i64) -> Result<i64>;

    fn sum_completed_study_minutes(&self, user_id: i64) -> Result<i64>;

    /// Latest `stat_date` with a daily row for the user.
    fn last_qualifying_day(&self, user_id: i64) -> Result<Option<NaiveDate>>;

    /// All settings as raw strings.
    fn get_settings(&self) -> Result<HashMap<String, String>>;

    // -- Status transitions (compare-and-swap) -------------------------------

    /// Marks the task COMPLETED if it belongs to `user_id` and is open.
    /// Returns `false` when no row matched.
    fn complete_task_if_open(&self, user_id: i64, task_id: i64, at: DateTime<Utc>)
    -> Result<bool>;

    /// Marks the session COMPLETED with `xp_earned` if it belongs to
    /// `user_id` and is open. Returns `false` when no row matched.
    fn complete_session_if_open(
        &self,
        user_id: i64,
        session_id: i64,
        xp_earned: i64,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    // -- Engine-owned writes -------------------------------------------------

    fn update_user_aggregates(&self, user_id: i64, aggregates: &UserAggregates) -> Result<()>;

    /// Raises stored progress to `progress` if it is higher, creating the
    /// row if missing. Returns the stored row.
    fn raise_badge_progress(
        &self,
        user_id: i64,
        badge_id: i64,
        progress: i64,
    ) -> Result<BadgeProgress>;

    /// One-way unlock. Returns `false` if the badge was already unlocked.
    fn unlock_badge(&self, user_id: i64, badge_id: i64, at: DateTime<Utc>) -> Result<bool>;

    /// Adds `delta` to the (user, date) row, creating it at zero first.
    fn upsert_daily_stat(&self, user_id: i64, date: NaiveDate, delta: &StatDelta)
    -> Result<DailyStat>;

    /// Appends an activity entry.
    fn record_activity(&self, entry: &NewActivity) -> Result<ActivityLogEntry>;
}

// ---------------------------------------------------------------------------
// Typed transaction helper
// ---------------------------------------------------------------------------

/// Runs `f` in a transaction and hands back its value or its own error.
///
/// When `f` fails the transaction is rolled back and `f`'s error is returned
/// unchanged. Storage failures (begin, commit) are converted with `From`.
pub fn transact<T, E, F>(storage: &dyn Storage, f: F) -> std::result::Result<T, E>
where
    E: From<StorageError>,
    F: FnOnce(&dyn Transaction) -> std::result::Result<T, E>,
{
    let mut body = Some(f);
    let mut outcome: Option<std::result::Result<T, E>> = None;

    let result = storage.run_in_transaction(&mut |tx| {
        let body = body
            .take()
            .ok_or_else(|| StorageError::Internal("transaction body ran twice".into()))?;
        match body(tx) {
            Ok(value) => {
                outcome = Some(Ok(value));
                Ok(())
            }
            Err(e) => {
                outcome = Some(Err(e));
                Err(StorageError::Aborted)
            }
        }
    });

    match (result, outcome) {
        (Ok(()), Some(Ok(value))) => Ok(value),
        (Err(StorageError::Aborted), Some(Err(e))) => Err(e),
        (Err(e), _) => Err(e.into()),
        (Ok(()), _) => Err(StorageError::Internal("transaction produced no outcome".into()).into()),
    }
}
