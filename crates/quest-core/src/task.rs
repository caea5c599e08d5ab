//! Task struct and builder.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{TaskCategory, TaskPriority, TaskStatus};

/// A unit of work that earns XP when completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub uuid: String,
    pub user_id: i64,

    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub status: TaskStatus,

    pub due_date: NaiveDate,
    /// Fixed at creation.
    pub xp_reward: i64,
    /// Non-null iff `status` is COMPLETED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a task.
///
/// `xp_reward = None` takes the `default_task_xp` setting at insert time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
    pub xp_reward: Option<i64>,
}

/// Typed partial update for tasks.
///
/// Only `Some` fields are applied. Completion is not reachable from here; it
/// goes through the completion engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdates {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<TaskCategory>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

impl TaskUpdates {
    /// Returns `true` if no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Builder for constructing a [`NewTask`] with a fluent API.
pub struct TaskBuilder {
    task: NewTask,
}

impl TaskBuilder {
    /// Creates a builder for a task owned by `user_id`, due today (UTC).
    pub fn new(user_id: i64, title: impl Into<String>) -> Self {
        Self {
            task: NewTask {
                user_id,
                title: title.into(),
                description: String::new(),
                category: TaskCategory::default(),
                priority: TaskPriority::default(),
                due_date: Utc::now().date_naive(),
                xp_reward: None,
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.task.description = description.into();
        self
    }

    pub fn category(mut self, category: TaskCategory) -> Self {
        self.task.category = category;
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn due_date(mut self, due: NaiveDate) -> Self {
        self.task.due_date = due;
        self
    }

    pub fn xp_reward(mut self, xp: i64) -> Self {
        self.task.xp_reward = Some(xp);
        self
    }

    /// Consumes the builder and returns the constructed [`NewTask`].
    pub fn build(self) -> NewTask {
        self.task
    }
}
