//! Daily stats aggregation.

use chrono::NaiveDate;

use quest_core::stats::{DailyStat, StatDelta};
use quest_storage::Transaction;

use crate::error::{EngineError, Result};

/// Adds `delta` to the user's row for `date`, creating it at zero first.
///
/// Deltas only ever add: a negative field is a constraint violation.
pub fn upsert_daily_stat(
    tx: &dyn Transaction,
    user_id: i64,
    date: NaiveDate,
    delta: StatDelta,
) -> Result<DailyStat> {
    if let Some((field, value)) = delta.negative_field() {
        return Err(EngineError::ConstraintViolation(format!(
            "daily stat {field} delta is negative ({value})"
        )));
    }
    Ok(tx.upsert_daily_stat(user_id, date, &delta)?)
}

/// The delta one completion contributes to today's row.
pub fn completion_delta(
    tasks_completed: i64,
    study_minutes: i64,
    xp_earned: i64,
    current_streak: i32,
) -> StatDelta {
    StatDelta {
        tasks_completed,
        xp_earned,
        study_minutes,
        streak_active: current_streak > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::user::NewUser;
    use quest_storage::{SqliteStore, Storage, transact};

    #[test]
    fn accumulates_per_day() {
        let store = SqliteStore::open_in_memory().unwrap();
        let uid = store
            .create_user(&NewUser::new("Ada", "ada@example.com"))
            .unwrap()
            .id;
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let row = transact::<_, EngineError, _>(&store, |tx| {
            upsert_daily_stat(tx, uid, day, completion_delta(1, 0, 20, 1))?;
            upsert_daily_stat(tx, uid, day, completion_delta(0, 45, 5, 1))
        })
        .unwrap();
        assert_eq!(row.tasks_completed, 1);
        assert_eq!(row.study_minutes, 45);
        assert_eq!(row.xp_earned, 25);
        assert!(row.streak_active);
    }

    #[test]
    fn negative_delta_is_constraint_violation() {
        let store = SqliteStore::open_in_memory().unwrap();
        let uid = store
            .create_user(&NewUser::new("Ada", "ada@example.com"))
            .unwrap()
            .id;
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = transact::<_, EngineError, _>(&store, |tx| {
            upsert_daily_stat(tx, uid, day, completion_delta(0, 0, -1, 0))
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation(_)));
        assert!(store.list_daily_stats(uid, 10).unwrap().is_empty());
    }
}
