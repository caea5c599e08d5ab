//! Task and session completion.
//!
//! One completion is one write transaction: the status compare-and-swap,
//! XP credit, level, streak, badges, the daily row and the activity entries
//! either all commit or none do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quest_core::activity::NewActivity;
use quest_core::badge::{BadgeCatalog, UnlockedBadge};
use quest_core::enums::{ActivityType, EventClass, SessionStatus, TaskStatus};
use quest_core::level::{LevelCurve, LevelUp};
use quest_core::setting::keys;
use quest_core::streak::{self, StreakState};
use quest_storage::{Storage, Transaction, UserAggregates, transact};

use crate::activity;
use crate::badges::BadgeEvaluator;
use crate::daily;
use crate::error::{EngineError, Result};

/// What a completion changed for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// Reward plus every badge bonus credited by this completion.
    pub xp_gained: i64,
    pub new_level: i32,
    pub leveled_up: bool,
    pub badges_unlocked: Vec<UnlockedBadge>,
    pub new_streak: i32,
}

/// The event being credited, after its status transition succeeded.
struct Completion {
    event: EventClass,
    entity_id: i64,
    title: String,
    reward: i64,
    study_minutes: i64,
}

/// Drives completions against a [`Storage`].
pub struct Orchestrator<'a> {
    storage: &'a dyn Storage,
    evaluator: BadgeEvaluator,
}

impl<'a> Orchestrator<'a> {
    /// An orchestrator with the built-in badge rules.
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self::with_evaluator(storage, BadgeEvaluator::new())
    }

    pub fn with_evaluator(storage: &'a dyn Storage, evaluator: BadgeEvaluator) -> Self {
        Self { storage, evaluator }
    }

    pub fn complete_task(&self, user_id: i64, task_id: i64) -> Result<CompletionOutcome> {
        self.complete_task_at(user_id, task_id, Utc::now())
    }

    /// Completes a task as of `now`.
    pub fn complete_task_at(
        &self,
        user_id: i64,
        task_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let outcome = transact(self.storage, |tx| {
            if !tx.complete_task_if_open(user_id, task_id, now)? {
                return Err(classify_task_miss(tx, user_id, task_id));
            }
            let task = tx.get_task(task_id)?;
            debug!(user_id, task_id, reward = task.xp_reward, "task transitioned");
            self.credit(
                tx,
                user_id,
                Completion {
                    event: EventClass::TaskCompletion,
                    entity_id: task_id,
                    title: task.title,
                    reward: task.xp_reward,
                    study_minutes: 0,
                },
                now,
            )
        })?;
        info!(user_id, task_id, xp = outcome.xp_gained, "task completed");
        Ok(outcome)
    }

    pub fn complete_session(&self, user_id: i64, session_id: i64) -> Result<CompletionOutcome> {
        self.complete_session_at(user_id, session_id, Utc::now())
    }

    /// Completes a study session as of `now`.
    ///
    /// The session earns `duration_minutes * session_xp_per_minute`.
    pub fn complete_session_at(
        &self,
        user_id: i64,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let outcome = transact(self.storage, |tx| {
            let session = tx.get_session(session_id)?;
            if session.user_id != user_id {
                return Err(EngineError::not_found("session", session_id));
            }
            let settings = tx.get_settings()?;
            let per_minute = match settings.get(keys::SESSION_XP_PER_MINUTE) {
                None => 1,
                Some(v) => v.trim().parse::<i64>().map_err(|_| {
                    EngineError::ConstraintViolation(format!(
                        "{} is not an integer: {v:?}",
                        keys::SESSION_XP_PER_MINUTE
                    ))
                })?,
            };
            let xp = session
                .duration_minutes
                .checked_mul(per_minute)
                .filter(|xp| *xp >= 0)
                .ok_or_else(|| {
                    EngineError::ConstraintViolation(format!(
                        "session {session_id} XP out of range"
                    ))
                })?;

            if !tx.complete_session_if_open(user_id, session_id, xp, now)? {
                return Err(classify_session_miss(&session.status, session_id));
            }
            debug!(user_id, session_id, xp, "session transitioned");
            self.credit(
                tx,
                user_id,
                Completion {
                    event: EventClass::SessionCompletion,
                    entity_id: session_id,
                    title: session.subject,
                    reward: xp,
                    study_minutes: session.duration_minutes,
                },
                now,
            )
        })?;
        info!(user_id, session_id, xp = outcome.xp_gained, "session completed");
        Ok(outcome)
    }

    /// Applies the reward and everything that follows from it.
    fn credit(
        &self,
        tx: &dyn Transaction,
        user_id: i64,
        done: Completion,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let curve = LevelCurve::from_settings(&tx.get_settings()?)?;
        let user = tx.get_user(user_id)?;
        let mut agg = UserAggregates::from(&user);
        let level_before = agg.level;

        // XP and counters.
        add_xp(&mut agg, done.reward)?;
        if done.event == EventClass::TaskCompletion {
            agg.tasks_completed = agg
                .tasks_completed
                .checked_add(1)
                .ok_or_else(|| overflow("tasks_completed"))?;
        }
        sync_level(tx, user_id, &curve, &mut agg, now)?;

        // Streak, read before today's daily row exists.
        let today = streak::utc_day(now);
        let last_day = tx.last_qualifying_day(user_id)?;
        let before = StreakState::new(agg.current_streak, agg.longest_streak);
        let after = streak::advance(before, last_day, today);
        agg.current_streak = after.current;
        agg.longest_streak = after.longest;
        tx.update_user_aggregates(user_id, &agg)?;
        if let Some(days) = streak::crossed_milestone(before.current, after.current) {
            activity::record(tx, &activity::streak_milestone(user_id, days, now))?;
        }

        // Badges, until a pass unlocks nothing.
        let catalog = BadgeCatalog::new(tx.list_active_badges()?);
        let mut unlocked = Vec::new();
        let mut bonus_total: i64 = 0;
        for _ in 0..=catalog.len() {
            let newly = self
                .evaluator
                .evaluate_pass(tx, user_id, &catalog, done.event, now)?;
            if newly.is_empty() {
                break;
            }
            for badge in &newly {
                add_xp(&mut agg, badge.xp_bonus)?;
                bonus_total = bonus_total
                    .checked_add(badge.xp_bonus)
                    .ok_or_else(|| overflow("xp_gained"))?;
                activity::record(tx, &activity::badge_unlocked(user_id, badge, now))?;
                unlocked.push(UnlockedBadge::from(badge));
            }
            tx.update_user_aggregates(user_id, &agg)?;
        }
        sync_level(tx, user_id, &curve, &mut agg, now)?;
        tx.update_user_aggregates(user_id, &agg)?;

        let xp_gained = done
            .reward
            .checked_add(bonus_total)
            .ok_or_else(|| overflow("xp_gained"))?;
        let tasks_delta = i64::from(done.event == EventClass::TaskCompletion);
        daily::upsert_daily_stat(
            tx,
            user_id,
            today,
            daily::completion_delta(tasks_delta, done.study_minutes, xp_gained, agg.current_streak),
        )?;

        let (kind, verb) = match done.event {
            EventClass::TaskCompletion => (ActivityType::TaskCompleted, "Completed task"),
            EventClass::SessionCompletion => (ActivityType::SessionCompleted, "Completed session"),
        };
        activity::record(
            tx,
            &NewActivity::new(user_id, kind, format!("{verb}: {}", done.title))
                .entity(done.event.entity_type(), done.entity_id)
                .xp_change(done.reward)
                .at(now),
        )?;

        Ok(CompletionOutcome {
            xp_gained,
            new_level: agg.level,
            leveled_up: agg.level > level_before,
            badges_unlocked: unlocked,
            new_streak: agg.current_streak,
        })
    }
}

fn overflow(field: &str) -> EngineError {
    EngineError::ConstraintViolation(format!("{field} overflow"))
}

fn add_xp(agg: &mut UserAggregates, xp: i64) -> Result<()> {
    agg.current_xp = agg
        .current_xp
        .checked_add(xp)
        .ok_or_else(|| overflow("current_xp"))?;
    agg.total_xp_earned = agg
        .total_xp_earned
        .checked_add(xp)
        .ok_or_else(|| overflow("total_xp_earned"))?;
    Ok(())
}

/// Sets `level = level_for(total_xp_earned)`, logging a rise.
fn sync_level(
    tx: &dyn Transaction,
    user_id: i64,
    curve: &LevelCurve,
    agg: &mut UserAggregates,
    now: DateTime<Utc>,
) -> Result<()> {
    let level = curve.level_for(agg.total_xp_earned);
    if level > agg.level {
        let up = LevelUp {
            from: agg.level,
            to: level,
        };
        activity::record(tx, &activity::level_up(user_id, up, now))?;
    }
    agg.level = level;
    Ok(())
}

/// Explains why the task compare-and-swap matched no row.
fn classify_task_miss(tx: &dyn Transaction, user_id: i64, task_id: i64) -> EngineError {
    match tx.get_task(task_id) {
        Err(e) => e.into(),
        Ok(task) if task.user_id != user_id => EngineError::not_found("task", task_id),
        Ok(task) if task.status == TaskStatus::Completed => {
            EngineError::already_completed("task", task_id)
        }
        Ok(task) => EngineError::invalid_transition("task", task_id, task.status.as_str()),
    }
}

fn classify_session_miss(status: &SessionStatus, session_id: i64) -> EngineError {
    if *status == SessionStatus::Completed {
        EngineError::already_completed("session", session_id)
    } else {
        EngineError::invalid_transition("session", session_id, status.as_str())
    }
}
