//! Streak tracking over UTC calendar days.
//!
//! A day qualifies when it has at least one completed task or session. The
//! day boundary is UTC midnight; callers convert timestamps with
//! [`utc_day`] and never use a local time zone.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Streak lengths that earn a STREAK_MILESTONE entry.
pub const STREAK_MILESTONES: &[i32] = &[3, 7, 14, 30, 60, 100];

/// A user's streak counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current: i32,
    pub longest: i32,
}

impl StreakState {
    pub fn new(current: i32, longest: i32) -> Self {
        Self { current, longest }
    }
}

/// Returns the UTC calendar day of a timestamp.
pub fn utc_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Applies one qualifying event on `today` to `state`.
///
/// `last_day` is the most recent qualifying day recorded before this event.
/// A last day equal to or after `today` counts as today, so repeating the
/// event on the same day leaves the streak unchanged.
pub fn advance(state: StreakState, last_day: Option<NaiveDate>, today: NaiveDate) -> StreakState {
    let current = match last_day {
        Some(last) if last >= today => state.current.max(1),
        Some(last) if today.pred_opt() == Some(last) => state.current.saturating_add(1),
        _ => 1,
    };
    StreakState {
        current,
        longest: state.longest.max(current),
    }
}

/// Returns the milestone reached by moving from `before` to `after`, if any.
pub fn crossed_milestone(before: i32, after: i32) -> Option<i32> {
    STREAK_MILESTONES
        .iter()
        .copied()
        .filter(|&m| before < m && after >= m)
        .max()
}
