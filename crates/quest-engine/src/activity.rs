//! Activity log recording.
//!
//! Entries are append-only; there is no edit or delete path.

use chrono::{DateTime, Utc};
use serde_json::json;

use quest_core::activity::{ActivityLogEntry, NewActivity};
use quest_core::badge::Badge;
use quest_core::enums::ActivityType;
use quest_core::level::LevelUp;
use quest_storage::{Storage, Transaction};

use crate::error::Result;

/// Appends `entry` inside the current transaction.
pub fn record(tx: &dyn Transaction, entry: &NewActivity) -> Result<ActivityLogEntry> {
    Ok(tx.record_activity(entry)?)
}

/// Recent entries for a user, newest first.
pub fn recent(storage: &dyn Storage, user_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>> {
    Ok(storage.list_activity(user_id, limit)?)
}

pub(crate) fn level_up(user_id: i64, up: LevelUp, at: DateTime<Utc>) -> NewActivity {
    NewActivity::new(
        user_id,
        ActivityType::LevelUp,
        format!("Reached level {}", up.to),
    )
    .metadata(json!({ "from": up.from, "to": up.to }))
    .at(at)
}

pub(crate) fn streak_milestone(user_id: i64, days: i32, at: DateTime<Utc>) -> NewActivity {
    NewActivity::new(
        user_id,
        ActivityType::StreakMilestone,
        format!("{days}-day streak"),
    )
    .metadata(json!({ "days": days }))
    .at(at)
}

pub(crate) fn badge_unlocked(user_id: i64, badge: &Badge, at: DateTime<Utc>) -> NewActivity {
    NewActivity::new(
        user_id,
        ActivityType::BadgeUnlocked,
        format!("Unlocked badge: {}", badge.name),
    )
    .entity("badge", badge.id)
    .xp_change(badge.xp_bonus)
    .metadata(json!({ "badge_key": badge.badge_key }))
    .at(at)
}
