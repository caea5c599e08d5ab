//! Badge catalog and per-user progress.
//!
//! Badges are shared reference data. Per-user state lives in
//! [`BadgeProgress`] rows that point into the catalog by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EventClass, RequirementType, TaskCategory};

/// A catalog badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    pub badge_key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_name: String,
    pub requirement_type: RequirementType,
    /// Progress needed to unlock.
    pub requirement_value: i64,
    /// Only meaningful for CATEGORY_MASTER badges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_category: Option<TaskCategory>,
    pub xp_bonus: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a catalog badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBadge {
    pub badge_key: String,
    pub name: String,
    pub description: String,
    pub icon_name: String,
    pub requirement_type: RequirementType,
    pub requirement_value: i64,
    pub requirement_category: Option<TaskCategory>,
    pub xp_bonus: i64,
}

impl NewBadge {
    pub fn new(
        badge_key: impl Into<String>,
        name: impl Into<String>,
        requirement_type: RequirementType,
        requirement_value: i64,
    ) -> Self {
        Self {
            badge_key: badge_key.into(),
            name: name.into(),
            description: String::new(),
            icon_name: String::new(),
            requirement_type,
            requirement_value,
            requirement_category: None,
            xp_bonus: 0,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn icon(mut self, icon_name: impl Into<String>) -> Self {
        self.icon_name = icon_name.into();
        self
    }

    pub fn category(mut self, category: TaskCategory) -> Self {
        self.requirement_category = Some(category);
        self
    }

    pub fn xp_bonus(mut self, bonus: i64) -> Self {
        self.xp_bonus = bonus;
        self
    }
}

/// A user's progress toward one badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub user_id: i64,
    pub badge_id: i64,
    /// Never decreases.
    pub progress: i64,
    /// One-way: once set it stays set.
    pub is_unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// A badge unlocked by a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedBadge {
    pub badge_id: i64,
    pub badge_key: String,
    pub name: String,
    pub xp_bonus: i64,
}

impl From<&Badge> for UnlockedBadge {
    fn from(badge: &Badge) -> Self {
        Self {
            badge_id: badge.id,
            badge_key: badge.badge_key.clone(),
            name: badge.name.clone(),
            xp_bonus: badge.xp_bonus,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog snapshot
// ---------------------------------------------------------------------------

/// A read-only snapshot of the active badge catalog, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct BadgeCatalog {
    badges: Vec<Badge>,
}

impl BadgeCatalog {
    /// Builds a snapshot, dropping inactive badges and sorting by id.
    pub fn new(mut badges: Vec<Badge>) -> Self {
        badges.retain(|b| b.is_active);
        badges.sort_by_key(|b| b.id);
        Self { badges }
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    pub fn get(&self, badge_id: i64) -> Option<&Badge> {
        self.badges.iter().find(|b| b.id == badge_id)
    }

    /// All active badges in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter()
    }

    /// Active badges re-evaluated for `event` by the built-in rules.
    pub fn triggered_by(&self, event: EventClass) -> impl Iterator<Item = &Badge> {
        self.badges
            .iter()
            .filter(move |b| b.requirement_type.triggered_by(event))
    }
}

/// The starter catalog seeded by `quest init`.
pub fn default_catalog() -> Vec<NewBadge> {
    vec![
        NewBadge::new("FIRST_TASK", "First Steps", RequirementType::TaskCount, 1)
            .description("Complete your first task")
            .icon("star")
            .xp_bonus(50),
        NewBadge::new("TASK_10", "Getting Things Done", RequirementType::TaskCount, 10)
            .description("Complete 10 tasks")
            .icon("check_circle")
            .xp_bonus(100),
        NewBadge::new("TASK_50", "Productivity Pro", RequirementType::TaskCount, 50)
            .description("Complete 50 tasks")
            .icon("workspace_premium")
            .xp_bonus(250),
        NewBadge::new("STREAK_3", "On a Roll", RequirementType::Streak, 3)
            .description("Keep a 3 day streak")
            .icon("local_fire_department")
            .xp_bonus(75),
        NewBadge::new("STREAK_7", "Week Warrior", RequirementType::Streak, 7)
            .description("Keep a 7 day streak")
            .icon("whatshot")
            .xp_bonus(150),
        NewBadge::new("XP_1000", "XP Hunter", RequirementType::XpMilestone, 1000)
            .description("Earn 1000 XP")
            .icon("emoji_events")
            .xp_bonus(100),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_new_badge;

    fn badge(id: i64, kind: RequirementType, active: bool) -> Badge {
        Badge {
            id,
            badge_key: format!("B{id}"),
            name: format!("Badge {id}"),
            description: String::new(),
            icon_name: String::new(),
            requirement_type: kind,
            requirement_value: 1,
            requirement_category: None,
            xp_bonus: 0,
            is_active: active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn catalog_orders_by_id_and_drops_inactive() {
        let catalog = BadgeCatalog::new(vec![
            badge(3, RequirementType::TaskCount, true),
            badge(1, RequirementType::Streak, true),
            badge(2, RequirementType::TaskCount, false),
        ]);
        let ids: Vec<i64> = catalog.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn catalog_filters_by_event() {
        let catalog = BadgeCatalog::new(vec![
            badge(1, RequirementType::TaskCount, true),
            badge(2, RequirementType::StudyMinutes, true),
            badge(3, RequirementType::XpMilestone, true),
            badge(4, RequirementType::Special, true),
        ]);
        let task_ids: Vec<i64> = catalog
            .triggered_by(EventClass::TaskCompletion)
            .map(|b| b.id)
            .collect();
        assert_eq!(task_ids, vec![1, 3]);
        let session_ids: Vec<i64> = catalog
            .triggered_by(EventClass::SessionCompletion)
            .map(|b| b.id)
            .collect();
        assert_eq!(session_ids, vec![2, 3]);
    }

    #[test]
    fn default_catalog_is_valid() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 6);
        for badge in &catalog {
            validate_new_badge(badge).unwrap();
        }
    }
}
