//! Engine error types.

use quest_core::validation::ValidationError;
use quest_storage::StorageError;

/// Errors returned by completion operations.
///
/// Every variant means the enclosing transaction was rolled back.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} {id} is already completed")]
    AlreadyCompleted { entity: String, id: String },

    #[error("{entity} {id} cannot be completed from {from}")]
    InvalidTransition {
        entity: String,
        id: String,
        from: String,
    },

    /// A data or arithmetic constraint would be broken.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The store failed; the operation did not happen.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StorageError),
}

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn already_completed(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::AlreadyCompleted {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl ToString,
        from: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            entity: entity.into(),
            id: id.to_string(),
            from: from.into(),
        }
    }

    /// Returns `true` for caller mistakes that leave the store untouched and
    /// can be reported without alarm.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::AlreadyCompleted { .. } | Self::InvalidTransition { .. }
        )
    }
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { entity, id } => Self::NotFound { entity, id },
            StorageError::Validation { message } => Self::ConstraintViolation(message),
            StorageError::InvalidTransition { entity, id, from, .. } => {
                Self::InvalidTransition { entity, id, from }
            }
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        Self::ConstraintViolation(e.to_string())
    }
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;
