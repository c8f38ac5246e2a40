use chirp_types::UserId;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A user with this username already exists.
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// A row referenced a user that does not exist.
    #[error("user does not exist: {0}")]
    UnknownUser(UserId),

    /// Failure reported by the database driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration to version {version} failed: {reason}")]
    Migration { version: i64, reason: String },

    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
    }

    pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
