//! Status, category and badge-rule enums.
//!
//! Every enum is stored and serialized as its SCREAMING_SNAKE string. Values
//! the code does not know (a custom badge rule, a category added by hand in
//! the database) survive a round trip through the catch-all variant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// Known string variants plus one catch-all variant holding the raw string.
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// All built-in variants, in declaration order.
            pub const BUILTIN: &'static [$name] = &[ $( Self::$variant, )+ ];

            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }

            /// Parses a string case-insensitively, accepting `-` for `_`.
            ///
            /// Returns `None` for anything that is not a built-in variant.
            pub fn parse_builtin(s: &str) -> Option<Self> {
                let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
                match Self::from(normalized) {
                    Self::$custom_variant(_) => None,
                    known => Some(known),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

// ===========================================================================
// TaskStatus
// ===========================================================================

define_enum! {
    /// Lifecycle state of a task.
    TaskStatus, default = Pending, custom_variant = Custom,
    variants: [
        (Pending, "PENDING"),
        (InProgress, "IN_PROGRESS"),
        (Completed, "COMPLETED"),
        (Overdue, "OVERDUE"),
        (Cancelled, "CANCELLED"),
    ]
}

impl TaskStatus {
    /// States from which a task may be completed.
    pub const OPEN: &'static [TaskStatus] = &[Self::Pending, Self::InProgress, Self::Overdue];

    /// Returns `true` if the task can still be completed.
    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

// ===========================================================================
// TaskCategory
// ===========================================================================

define_enum! {
    /// Subject area of a task.
    TaskCategory, default = Personal, custom_variant = Custom,
    variants: [
        (Study, "STUDY"),
        (Mathematics, "MATHEMATICS"),
        (History, "HISTORY"),
        (Science, "SCIENCE"),
        (Exercise, "EXERCISE"),
        (Social, "SOCIAL"),
        (Work, "WORK"),
        (Personal, "PERSONAL"),
    ]
}

// ===========================================================================
// TaskPriority
// ===========================================================================

define_enum! {
    TaskPriority, default = Medium, custom_variant = Custom,
    variants: [
        (Low, "LOW"),
        (Medium, "MEDIUM"),
        (High, "HIGH"),
    ]
}

// ===========================================================================
// SessionStatus
// ===========================================================================

define_enum! {
    /// Lifecycle state of a study session.
    SessionStatus, default = Scheduled, custom_variant = Custom,
    variants: [
        (Scheduled, "SCHEDULED"),
        (InProgress, "IN_PROGRESS"),
        (Completed, "COMPLETED"),
        (Cancelled, "CANCELLED"),
        (Missed, "MISSED"),
    ]
}

impl SessionStatus {
    /// States from which a session may be completed.
    pub const OPEN: &'static [SessionStatus] = &[Self::Scheduled, Self::InProgress];

    /// Returns `true` if the session can still be completed.
    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

// ===========================================================================
// ActivityType
// ===========================================================================

define_enum! {
    /// Kind of an activity log entry.
    ActivityType, default = XpEarned, custom_variant = Other,
    variants: [
        (TaskCreated, "TASK_CREATED"),
        (TaskCompleted, "TASK_COMPLETED"),
        (TaskDeleted, "TASK_DELETED"),
        (SessionCompleted, "SESSION_COMPLETED"),
        (LevelUp, "LEVEL_UP"),
        (BadgeUnlocked, "BADGE_UNLOCKED"),
        (StreakMilestone, "STREAK_MILESTONE"),
        (XpEarned, "XP_EARNED"),
    ]
}

// ===========================================================================
// RequirementType
// ===========================================================================

define_enum! {
    /// What a badge counts toward its threshold.
    RequirementType, default = TaskCount, custom_variant = Custom,
    variants: [
        (TaskCount, "TASK_COUNT"),
        (Streak, "STREAK"),
        (XpMilestone, "XP_MILESTONE"),
        (CategoryMaster, "CATEGORY_MASTER"),
        (SessionCount, "SESSION_COUNT"),
        (StudyMinutes, "STUDY_MINUTES"),
        (Special, "SPECIAL"),
    ]
}

impl RequirementType {
    /// Returns `true` if a badge of this type is re-evaluated on the given event.
    ///
    /// Custom and special types return `false`; they only participate when a
    /// rule is registered for them explicitly.
    pub fn triggered_by(&self, event: EventClass) -> bool {
        match self {
            Self::TaskCount | Self::CategoryMaster => event == EventClass::TaskCompletion,
            Self::SessionCount | Self::StudyMinutes => event == EventClass::SessionCompletion,
            Self::Streak | Self::XpMilestone => true,
            Self::Special | Self::Custom(_) => false,
        }
    }
}

// ===========================================================================
// SettingType
// ===========================================================================

define_enum! {
    /// Value type of an app setting.
    SettingType, default = String, custom_variant = Custom,
    variants: [
        (String, "STRING"),
        (Integer, "INTEGER"),
        (Boolean, "BOOLEAN"),
        (Json, "JSON"),
    ]
}

// ===========================================================================
// EventClass
// ===========================================================================

/// The class of qualifying event that triggered an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    TaskCompletion,
    SessionCompletion,
}

impl EventClass {
    /// Entity type recorded on activity entries for this event.
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::TaskCompletion => "task",
            Self::SessionCompletion => "session",
        }
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TaskCompletion => "task_completion",
            Self::SessionCompletion => "session_completion",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_default_is_pending() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert!(TaskStatus::Pending.is_default());
        assert!(!TaskStatus::Completed.is_default());
    }

    #[test]
    fn task_status_serde_uses_stored_form() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, r#""IN_PROGRESS""#);
        let back: TaskStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }

    #[test]
    fn custom_requirement_type_roundtrip() {
        let json = r#""NIGHT_OWL""#;
        let r: RequirementType = serde_json::from_str(json).unwrap();
        assert_eq!(r, RequirementType::Custom("NIGHT_OWL".into()));
        assert!(!r.is_builtin());
        assert_eq!(serde_json::to_string(&r).unwrap(), json);
    }

    #[test]
    fn open_states() {
        assert!(TaskStatus::Pending.is_open());
        assert!(TaskStatus::InProgress.is_open());
        assert!(TaskStatus::Overdue.is_open());
        assert!(!TaskStatus::Completed.is_open());
        assert!(!TaskStatus::Cancelled.is_open());

        assert!(SessionStatus::Scheduled.is_open());
        assert!(!SessionStatus::Missed.is_open());
    }

    #[test]
    fn parse_builtin_is_lenient() {
        assert_eq!(TaskCategory::parse_builtin("math"), None);
        assert_eq!(
            TaskCategory::parse_builtin("mathematics"),
            Some(TaskCategory::Mathematics)
        );
        assert_eq!(
            TaskStatus::parse_builtin("in-progress"),
            Some(TaskStatus::InProgress)
        );
        assert_eq!(SettingType::parse_builtin(" json "), Some(SettingType::Json));
    }

    #[test]
    fn requirement_triggers() {
        use EventClass::*;
        assert!(RequirementType::TaskCount.triggered_by(TaskCompletion));
        assert!(!RequirementType::TaskCount.triggered_by(SessionCompletion));
        assert!(RequirementType::StudyMinutes.triggered_by(SessionCompletion));
        assert!(RequirementType::Streak.triggered_by(SessionCompletion));
        assert!(RequirementType::XpMilestone.triggered_by(TaskCompletion));
        assert!(!RequirementType::Special.triggered_by(TaskCompletion));
    }
}
