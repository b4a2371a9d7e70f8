use thiserror::Error;

/// Failure kinds for the store and service layer.
///
/// "No rows" and "store broken" must stay distinguishable all the way to the
/// UI, so every function returns one of these instead of collapsing failures
/// into a boolean or an empty list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid matricule or password")]
    Auth,

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl StoreError {
    /// Stable wire code for the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Invalid(_) => "validation_failed",
            StoreError::NotFound(_) => "not_found",
            StoreError::Conflict(_) => "conflict",
            StoreError::Auth => "auth_failed",
            StoreError::Db(_) => "db_failed",
            StoreError::Hash(_) => "hash_failed",
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::Invalid(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }
}

/// True when the underlying SQLite error is a UNIQUE/PRIMARY KEY violation.
/// Used to turn check-then-insert races into a typed conflict.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
