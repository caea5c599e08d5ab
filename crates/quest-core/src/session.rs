//! Study sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::SessionStatus;

/// A scheduled block of study time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: i64,
    pub uuid: String,
    pub user_id: i64,
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: SessionStatus,
    /// Zero until the session is completed.
    pub xp_earned: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub user_id: i64,
    pub subject: String,
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl NewSession {
    /// Creates a session scheduled for now.
    pub fn new(user_id: i64, subject: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            user_id,
            subject: subject.into(),
            description: String::new(),
            scheduled_at: Utc::now(),
            duration_minutes,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = at;
        self
    }
}
