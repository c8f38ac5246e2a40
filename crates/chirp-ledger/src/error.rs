use chirp_types::{PostId, UserId};

/// Errors produced by like ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The storage rejected a second active row for one pair.
    #[error("like invariant violated for user {user_id} on post {post_id}: {reason}")]
    InvariantViolation {
        user_id: UserId,
        post_id: PostId,
        reason: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store error: {0}")]
    Store(#[from] chirp_store::StoreError),

    #[error("internal ledger error: {0}")]
    Internal(String),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
