//! Errors returned by the entity store.

use quest_core::validation::ValidationError;

/// Everything a [`Storage`](crate::traits::Storage) call can fail with.
///
/// The first three variants describe the caller's request; the rest describe
/// the database. The engine relies on that split when it maps these into its
/// own errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No row with this id/key (`entity` is `"user"`, `"task"`, `"setting"`, ...).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input rejected by field validation or a CHECK/UNIQUE constraint.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A status edit outside the entity's lifecycle, e.g. a task set to
    /// COMPLETED outside the engine.
    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    /// Another connection held the write lock past `busy_timeout`.
    #[error("database locked: {0}")]
    DatabaseLocked(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// `BEGIN`/`COMMIT` failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// The transaction body returned an error and everything was rolled back.
    #[error("transaction aborted")]
    Aborted,

    /// Schema creation failed, or the file comes from a newer schema.
    #[error("schema {name} failed: {reason}")]
    Migration { name: String, reason: String },

    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// Activity metadata or a JSON setting did not round-trip.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for storage calls.
pub type Result<T> = std::result::Result<T, StorageError>;

impl From<ValidationError> for StorageError {
    fn from(e: ValidationError) -> Self {
        Self::validation(e.to_string())
    }
}

impl StorageError {
    /// Shorthand for [`StorageError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl ToString,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            entity: entity.into(),
            id: id.to_string(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Lock contention and connection trouble; the same call may succeed
    /// later. Request errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DatabaseLocked(_) | Self::Connection(_) | Self::Transaction(_) => true,
            Self::Query(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}
