//! Per-day aggregates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One aggregate row per user per UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub user_id: i64,
    pub stat_date: NaiveDate,
    pub tasks_completed: i64,
    pub xp_earned: i64,
    pub study_minutes: i64,
    pub streak_active: bool,
}

/// Increment applied to a [`DailyStat`] row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    pub tasks_completed: i64,
    pub xp_earned: i64,
    pub study_minutes: i64,
    pub streak_active: bool,
}

impl StatDelta {
    /// Returns the first negative counter, if any, by name.
    pub fn negative_field(&self) -> Option<(&'static str, i64)> {
        [
            ("tasks_completed", self.tasks_completed),
            ("xp_earned", self.xp_earned),
            ("study_minutes", self.study_minutes),
        ]
        .into_iter()
        .find(|&(_, v)| v < 0)
    }
}
