//! Badge progress evaluation.
//!
//! Each [`RequirementType`] maps to a [`ProgressRule`] that recomputes a
//! user's progress from source state. The evaluator stores the maximum of
//! the old and new value and unlocks a badge once, when progress reaches its
//! requirement. Types without a registered rule are skipped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use quest_core::badge::{Badge, BadgeCatalog};
use quest_core::enums::{EventClass, RequirementType};
use quest_storage::Transaction;

use crate::error::Result;

/// Computes the current progress of one user towards one badge.
pub trait ProgressRule: Send + Sync {
    /// Progress from source state. Must not depend on the stored value.
    fn progress(&self, tx: &dyn Transaction, user_id: i64, badge: &Badge) -> Result<i64>;

    /// Whether completions of this class re-evaluate the rule.
    fn triggered_by(&self, _event: EventClass) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Built-in rules
// ---------------------------------------------------------------------------

/// Completed tasks of the user.
pub struct TaskCountRule;

impl ProgressRule for TaskCountRule {
    fn progress(&self, tx: &dyn Transaction, user_id: i64, _badge: &Badge) -> Result<i64> {
        Ok(tx.count_completed_tasks(user_id, None)?)
    }

    fn triggered_by(&self, event: EventClass) -> bool {
        RequirementType::TaskCount.triggered_by(event)
    }
}

/// Completed tasks in the badge's category.
pub struct CategoryMasterRule;

impl ProgressRule for CategoryMasterRule {
    fn progress(&self, tx: &dyn Transaction, user_id: i64, badge: &Badge) -> Result<i64> {
        match &badge.requirement_category {
            Some(category) => Ok(tx.count_completed_tasks(user_id, Some(category))?),
            None => {
                warn!(badge = %badge.badge_key, "category badge without a category");
                Ok(0)
            }
        }
    }

    fn triggered_by(&self, event: EventClass) -> bool {
        RequirementType::CategoryMaster.triggered_by(event)
    }
}

/// Completed study sessions.
pub struct SessionCountRule;

impl ProgressRule for SessionCountRule {
    fn progress(&self, tx: &dyn Transaction, user_id: i64, _badge: &Badge) -> Result<i64> {
        Ok(tx.count_completed_sessions(user_id)?)
    }

    fn triggered_by(&self, event: EventClass) -> bool {
        RequirementType::SessionCount.triggered_by(event)
    }
}

/// Minutes of completed study sessions.
pub struct StudyMinutesRule;

impl ProgressRule for StudyMinutesRule {
    fn progress(&self, tx: &dyn Transaction, user_id: i64, _badge: &Badge) -> Result<i64> {
        Ok(tx.sum_completed_study_minutes(user_id)?)
    }

    fn triggered_by(&self, event: EventClass) -> bool {
        RequirementType::StudyMinutes.triggered_by(event)
    }
}

/// The user's longest streak.
pub struct StreakRule;

impl ProgressRule for StreakRule {
    fn progress(&self, tx: &dyn Transaction, user_id: i64, _badge: &Badge) -> Result<i64> {
        Ok(i64::from(tx.get_user(user_id)?.longest_streak))
    }

    fn triggered_by(&self, event: EventClass) -> bool {
        RequirementType::Streak.triggered_by(event)
    }
}

/// Lifetime XP of the user.
pub struct XpMilestoneRule;

impl ProgressRule for XpMilestoneRule {
    fn progress(&self, tx: &dyn Transaction, user_id: i64, _badge: &Badge) -> Result<i64> {
        Ok(tx.get_user(user_id)?.total_xp_earned)
    }

    fn triggered_by(&self, event: EventClass) -> bool {
        RequirementType::XpMilestone.triggered_by(event)
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Registry of progress rules keyed by requirement type.
pub struct BadgeEvaluator {
    rules: HashMap<RequirementType, Box<dyn ProgressRule>>,
}

impl Default for BadgeEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl BadgeEvaluator {
    /// An evaluator with the built-in rules registered.
    pub fn new() -> Self {
        let mut rules: HashMap<RequirementType, Box<dyn ProgressRule>> = HashMap::new();
        rules.insert(RequirementType::TaskCount, Box::new(TaskCountRule));
        rules.insert(RequirementType::CategoryMaster, Box::new(CategoryMasterRule));
        rules.insert(RequirementType::SessionCount, Box::new(SessionCountRule));
        rules.insert(RequirementType::StudyMinutes, Box::new(StudyMinutesRule));
        rules.insert(RequirementType::Streak, Box::new(StreakRule));
        rules.insert(RequirementType::XpMilestone, Box::new(XpMilestoneRule));
        Self { rules }
    }

    /// An evaluator with no rules at all.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registers or replaces the rule for `requirement`.
    pub fn with_rule(mut self, requirement: RequirementType, rule: Box<dyn ProgressRule>) -> Self {
        self.rules.insert(requirement, rule);
        self
    }

    pub fn has_rule(&self, requirement: &RequirementType) -> bool {
        self.rules.contains_key(requirement)
    }

    /// One pass over the catalog in badge id order.
    ///
    /// Raises stored progress for every badge whose rule fires on `event`
    /// and returns the badges unlocked by this pass. Crediting bonuses is
    /// left to the caller.
    pub fn evaluate_pass(
        &self,
        tx: &dyn Transaction,
        user_id: i64,
        catalog: &BadgeCatalog,
        event: EventClass,
        at: DateTime<Utc>,
    ) -> Result<Vec<Badge>> {
        let mut unlocked = Vec::new();
        for badge in catalog.iter() {
            let Some(rule) = self.rules.get(&badge.requirement_type) else {
                debug!(
                    badge = %badge.badge_key,
                    requirement = %badge.requirement_type,
                    "no progress rule registered; skipping"
                );
                continue;
            };
            if !rule.triggered_by(event) {
                continue;
            }

            let current = rule.progress(tx, user_id, badge)?;
            let stored = tx.raise_badge_progress(user_id, badge.id, current)?;
            if stored.is_unlocked || stored.progress < badge.requirement_value {
                continue;
            }
            if tx.unlock_badge(user_id, badge.id, at)? {
                debug!(
                    badge = %badge.badge_key,
                    progress = stored.progress,
                    "badge unlocked"
                );
                unlocked.push(badge.clone());
            }
        }
        Ok(unlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use quest_core::badge::NewBadge;
    use quest_core::task::TaskBuilder;
    use quest_core::user::NewUser;
    use quest_storage::{SqliteStore, Storage, transact};

    struct Fixed(i64);

    impl ProgressRule for Fixed {
        fn progress(&self, _tx: &dyn Transaction, _user_id: i64, _badge: &Badge) -> Result<i64> {
            Ok(self.0)
        }
    }

    fn setup(badges: &[NewBadge]) -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        for b in badges {
            store.create_badge(b).unwrap();
        }
        let user = store
            .create_user(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        (store, user.id)
    }

    fn run_pass(
        store: &SqliteStore,
        evaluator: &BadgeEvaluator,
        uid: i64,
        event: EventClass,
    ) -> Vec<String> {
        transact::<_, EngineError, _>(store, |tx| {
            let catalog = BadgeCatalog::new(tx.list_active_badges()?);
            let unlocked = evaluator.evaluate_pass(tx, uid, &catalog, event, Utc::now())?;
            Ok(unlocked.into_iter().map(|b| b.badge_key).collect())
        })
        .unwrap()
    }

    #[test]
    fn task_count_unlocks_once() {
        let (store, uid) = setup(&[NewBadge::new("FIRST", "First", RequirementType::TaskCount, 1)]);
        let task = store
            .create_task(&TaskBuilder::new(uid, "Read").build())
            .unwrap();
        transact::<_, EngineError, _>(&store, |tx| {
            tx.complete_task_if_open(uid, task.id, Utc::now())?;
            Ok(())
        })
        .unwrap();

        let evaluator = BadgeEvaluator::new();
        assert_eq!(
            run_pass(&store, &evaluator, uid, EventClass::TaskCompletion),
            vec!["FIRST".to_string()]
        );
        assert!(run_pass(&store, &evaluator, uid, EventClass::TaskCompletion).is_empty());
    }

    #[test]
    fn trigger_class_respected() {
        let (store, uid) = setup(&[NewBadge::new(
            "STUDY",
            "Study",
            RequirementType::SessionCount,
            1,
        )]);
        let evaluator = BadgeEvaluator::empty()
            .with_rule(RequirementType::SessionCount, Box::new(SessionCountRule));
        assert!(run_pass(&store, &evaluator, uid, EventClass::TaskCompletion).is_empty());
        let badges = store.list_user_badges(uid).unwrap();
        assert_eq!(badges[0].progress, 0);
    }

    #[test]
    fn progress_never_decreases() {
        let (store, uid) = setup(&[NewBadge::new(
            "NIGHT_OWL",
            "Night owl",
            RequirementType::Custom("NIGHT_OWL".into()),
            10,
        )]);
        let high = BadgeEvaluator::empty()
            .with_rule(RequirementType::Custom("NIGHT_OWL".into()), Box::new(Fixed(6)));
        let low = BadgeEvaluator::empty()
            .with_rule(RequirementType::Custom("NIGHT_OWL".into()), Box::new(Fixed(2)));

        run_pass(&store, &high, uid, EventClass::TaskCompletion);
        run_pass(&store, &low, uid, EventClass::TaskCompletion);
        let badges = store.list_user_badges(uid).unwrap();
        assert_eq!(badges[0].progress, 6);
        assert!(!badges[0].is_unlocked);
    }

    #[test]
    fn unregistered_type_skipped() {
        let (store, uid) = setup(&[NewBadge::new("ODD", "Odd", RequirementType::Special, 1)]);
        let evaluator = BadgeEvaluator::new();
        assert!(!evaluator.has_rule(&RequirementType::Special));
        assert!(run_pass(&store, &evaluator, uid, EventClass::TaskCompletion).is_empty());
    }
}
