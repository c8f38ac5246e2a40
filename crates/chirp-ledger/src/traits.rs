use async_trait::async_trait;
use chirp_types::{LikeEvent, Liker, PostId, UserId};

use crate::error::LedgerResult;

/// Write boundary of the like ledger.
///
/// Every call is one atomic unit of work: concurrent calls for the same
/// (user, post) pair serialize, so at most one row per pair is ever active.
#[async_trait]
pub trait LikeWriter: Send + Sync {
    /// Flip the pair's like state and return the affected row.
    async fn toggle(&self, user_id: UserId, post_id: PostId) -> LedgerResult<LikeEvent>;

    /// Deactivate the pair's active row, if any.
    ///
    /// Returns `false` (not an error) when nothing was active.
    async fn deactivate(&self, user_id: UserId, post_id: PostId) -> LedgerResult<bool>;
}

/// Read boundary of the like ledger.
#[async_trait]
pub trait LikeReader: Send + Sync {
    /// Users currently liking a post. Callers must treat the order as
    /// unspecified.
    async fn list_likers(&self, post_id: PostId) -> LedgerResult<Vec<Liker>>;

    /// Number of active likes on a post.
    async fn like_count(&self, post_id: PostId) -> LedgerResult<u64>;

    async fn is_liking(&self, user_id: UserId, post_id: PostId) -> LedgerResult<bool>;

    /// Every row ever written for a pair, in id order.
    async fn history(&self, user_id: UserId, post_id: PostId) -> LedgerResult<Vec<LikeEvent>>;

    /// Every row for a post, active or not, in id order.
    async fn events_for_post(&self, post_id: PostId) -> LedgerResult<Vec<LikeEvent>>;

    /// Posts that have at least one like row.
    async fn liked_posts(&self) -> LedgerResult<Vec<PostId>>;
}

/// A full ledger: readable and writable.
pub trait LikeLedger: LikeWriter + LikeReader {}

impl<T: LikeWriter + LikeReader + ?Sized> LikeLedger for T {}
