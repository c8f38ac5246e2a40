use async_trait::async_trait;
use chirp_types::{NewPost, Post, PostId, User, UserId};

use crate::error::StoreResult;

/// Persists username/password-hash pairs.
///
/// Implementations must reject a second user with the same username even
/// when two `create_user` calls race.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether a user with this username exists.
    async fn exists(&self, username: &str) -> StoreResult<bool>;

    /// Insert a user. Fails with `DuplicateUsername` if the name is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
}

/// Persists posts keyed by author.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a post stamped with the current time. Fails with
    /// `UnknownUser` if the author does not exist.
    async fn create_post(&self, post: NewPost) -> StoreResult<Post>;

    async fn get_post(&self, id: PostId) -> StoreResult<Option<Post>>;

    /// All posts by an author, oldest first.
    async fn posts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Post>>;

    async fn post_exists(&self, id: PostId) -> StoreResult<bool> {
        Ok(self.get_post(id).await?.is_some())
    }
}
