//! Filter types for querying tasks.

use chrono::NaiveDate;

use crate::enums::{TaskCategory, TaskPriority, TaskStatus};

/// Filter for task queries.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub user_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub priority: Option<TaskPriority>,

    // Due date range (inclusive)
    pub due_after: Option<NaiveDate>,
    pub due_before: Option<NaiveDate>,

    pub limit: Option<i64>,
}

impl TaskFilter {
    /// Filter matching every task of one user.
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }
}
