//! Validation rules for new entities and setting values.

use crate::badge::NewBadge;
use crate::enums::{RequirementType, SettingType, TaskStatus};
use crate::session::NewSession;
use crate::setting::parse_bool;
use crate::task::{NewTask, Task};
use crate::user::NewUser;

/// Maximum task title length, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,

    #[error("email is required")]
    EmailRequired,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("title is required")]
    TitleRequired,

    #[error("title must be {MAX_TITLE_LEN} characters or less (got {0})")]
    TitleTooLong(usize),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("xp reward cannot be negative (got {0})")]
    NegativeXp(i64),

    #[error("subject is required")]
    SubjectRequired,

    #[error("duration must be positive (got {0} minutes)")]
    NonPositiveDuration(i64),

    #[error("badge key is required")]
    BadgeKeyRequired,

    #[error("requirement value must be positive (got {0})")]
    NonPositiveRequirement(i64),

    #[error("xp bonus cannot be negative (got {0})")]
    NegativeBonus(i64),

    #[error("CATEGORY_MASTER badges need a requirement category")]
    CategoryRequired,

    #[error("completed tasks must have completed_at timestamp")]
    CompletedWithoutTimestamp,

    #[error("tasks that are not completed cannot have completed_at timestamp")]
    NotCompletedWithTimestamp,

    #[error("invalid value for setting {key}: {reason}")]
    InvalidSettingValue { key: String, reason: String },

    #[error("invalid level curve: {0}")]
    InvalidCurve(String),
}

/// Validates a user registration.
pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationError> {
    if user.name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let email = user.email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidEmail(email.to_owned())),
    }
}

/// Validates a task before insert.
pub fn validate_new_task(task: &NewTask) -> Result<(), ValidationError> {
    validate_title(&task.title)?;
    if !task.category.is_builtin() {
        return Err(ValidationError::InvalidCategory(
            task.category.as_str().to_owned(),
        ));
    }
    if !task.priority.is_builtin() {
        return Err(ValidationError::InvalidPriority(
            task.priority.as_str().to_owned(),
        ));
    }
    if let Some(xp) = task.xp_reward {
        if xp < 0 {
            return Err(ValidationError::NegativeXp(xp));
        }
    }
    Ok(())
}

/// Checks the stored-task invariants: built-in status and
/// `completed_at` set iff the task is completed.
pub fn validate_task(task: &Task) -> Result<(), ValidationError> {
    validate_title(&task.title)?;
    if !task.status.is_builtin() {
        return Err(ValidationError::InvalidStatus(task.status.as_str().to_owned()));
    }
    if task.xp_reward < 0 {
        return Err(ValidationError::NegativeXp(task.xp_reward));
    }
    match (&task.status, task.completed_at) {
        (TaskStatus::Completed, None) => Err(ValidationError::CompletedWithoutTimestamp),
        (status, Some(_)) if *status != TaskStatus::Completed => {
            Err(ValidationError::NotCompletedWithTimestamp)
        }
        _ => Ok(()),
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong(len));
    }
    Ok(())
}

/// Validates a study session before insert.
pub fn validate_new_session(session: &NewSession) -> Result<(), ValidationError> {
    if session.subject.trim().is_empty() {
        return Err(ValidationError::SubjectRequired);
    }
    if session.duration_minutes <= 0 {
        return Err(ValidationError::NonPositiveDuration(session.duration_minutes));
    }
    Ok(())
}

/// Validates a catalog badge before insert.
pub fn validate_new_badge(badge: &NewBadge) -> Result<(), ValidationError> {
    if badge.badge_key.trim().is_empty() {
        return Err(ValidationError::BadgeKeyRequired);
    }
    if badge.name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if badge.requirement_value <= 0 {
        return Err(ValidationError::NonPositiveRequirement(
            badge.requirement_value,
        ));
    }
    if badge.xp_bonus < 0 {
        return Err(ValidationError::NegativeBonus(badge.xp_bonus));
    }
    if badge.requirement_type == RequirementType::CategoryMaster
        && badge.requirement_category.is_none()
    {
        return Err(ValidationError::CategoryRequired);
    }
    Ok(())
}

/// Checks that `value` parses as the declared setting type.
pub fn validate_setting_value(
    key: &str,
    value: &str,
    setting_type: &SettingType,
) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidSettingValue {
        key: key.to_owned(),
        reason,
    };
    match setting_type {
        SettingType::String => Ok(()),
        SettingType::Integer => value
            .trim()
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| invalid(format!("expected an integer, got {value:?}"))),
        SettingType::Boolean => parse_bool(value)
            .map(|_| ())
            .ok_or_else(|| invalid(format!("expected true/false, got {value:?}"))),
        SettingType::Json => serde_json::from_str::<serde_json::Value>(value)
            .map(|_| ())
            .map_err(|e| invalid(e.to_string())),
        SettingType::Custom(other) => Err(invalid(format!("unknown setting type {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskBuilder;

    #[test]
    fn valid_user() {
        assert!(validate_new_user(&NewUser::new("Ada", "ada@example.com")).is_ok());
    }

    #[test]
    fn user_email_rules() {
        assert_eq!(
            validate_new_user(&NewUser::new("Ada", "")).unwrap_err(),
            ValidationError::EmailRequired
        );
        assert!(matches!(
            validate_new_user(&NewUser::new("Ada", "not-an-email")),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert_eq!(
            validate_new_user(&NewUser::new("  ", "ada@example.com")).unwrap_err(),
            ValidationError::NameRequired
        );
    }

    #[test]
    fn title_required() {
        let task = TaskBuilder::new(1, "").build();
        assert!(matches!(
            validate_new_task(&task),
            Err(ValidationError::TitleRequired)
        ));
    }

    #[test]
    fn title_too_long() {
        let task = TaskBuilder::new(1, "x".repeat(MAX_TITLE_LEN + 1)).build();
        assert!(matches!(
            validate_new_task(&task),
            Err(ValidationError::TitleTooLong(201))
        ));
    }

    #[test]
    fn negative_reward_rejected() {
        let task = TaskBuilder::new(1, "Read").xp_reward(-5).build();
        assert_eq!(
            validate_new_task(&task).unwrap_err(),
            ValidationError::NegativeXp(-5)
        );
    }

    #[test]
    fn session_duration_must_be_positive() {
        let session = NewSession::new(1, "Algebra", 0);
        assert_eq!(
            validate_new_session(&session).unwrap_err(),
            ValidationError::NonPositiveDuration(0)
        );
    }

    #[test]
    fn category_master_needs_category() {
        let badge = NewBadge::new("MATH_5", "Mathlete", RequirementType::CategoryMaster, 5);
        assert_eq!(
            validate_new_badge(&badge).unwrap_err(),
            ValidationError::CategoryRequired
        );
    }

    #[test]
    fn setting_values_typed() {
        assert!(validate_setting_value("k", "42", &SettingType::Integer).is_ok());
        assert!(validate_setting_value("k", "4.2", &SettingType::Integer).is_err());
        assert!(validate_setting_value("k", "TRUE", &SettingType::Boolean).is_ok());
        assert!(validate_setting_value("k", "yes", &SettingType::Boolean).is_err());
        assert!(validate_setting_value("k", "[1,2]", &SettingType::Json).is_ok());
        assert!(validate_setting_value("k", "[1,", &SettingType::Json).is_err());
        assert!(validate_setting_value("k", "anything", &SettingType::String).is_ok());
    }
}
