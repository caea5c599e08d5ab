//! Append-only activity log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ActivityType;

/// An immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub activity_type: ActivityType,
    /// "task", "session", "badge" or "user".
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<i64>,
    pub description: String,
    pub xp_change: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an activity entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub user_id: i64,
    pub activity_type: ActivityType,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub description: String,
    pub xp_change: i64,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl NewActivity {
    /// Creates an entry about the user itself, stamped now.
    pub fn new(user_id: i64, activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            user_id,
            activity_type,
            entity_type: "user".to_owned(),
            entity_id: Some(user_id),
            description: description.into(),
            xp_change: 0,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn entity(mut self, entity_type: impl Into<String>, entity_id: i64) -> Self {
        self.entity_type = entity_type.into();
        self.entity_id = Some(entity_id);
        self
    }

    pub fn xp_change(mut self, xp: i64) -> Self {
        self.xp_change = xp;
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
