use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chirp_types::{NewPost, Post, PostId, User, UserId};
use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::traits::{CredentialStore, PostStore};

/// In-memory credential and post store.
///
/// Intended for tests and embedding. All state sits behind one `RwLock`;
/// every write (including the uniqueness check) happens under a single
/// write guard.
pub struct InMemoryStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    next_user_id: i64,
    next_post_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
        }
    }

    pub fn user_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").users.len()
    }

    pub fn post_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").posts.len()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Internal("store read lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Internal("store write lock poisoned".into()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("users", &self.user_count())
            .field("posts", &self.post_count())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self.read()?.users.values().any(|u| u.username == username))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == username) {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }
        state.next_user_id += 1;
        let user = User {
            id: UserId::new(state.next_user_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let mut state = self.write()?;
        if !state.users.contains_key(&post.user_id) {
            return Err(StoreError::UnknownUser(post.user_id));
        }
        state.next_post_id += 1;
        let post = post.into_post(PostId::new(state.next_post_id), Utc::now());
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Option<Post>> {
        Ok(self.read()?.posts.get(&id).cloned())
    }

    async fn posts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Post>> {
        Ok(self
            .read()?
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}
