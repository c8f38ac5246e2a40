use async_trait::async_trait;
use chirp_types::{NewPost, Post, PostId, User, UserId};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use crate::traits::{CredentialStore, PostStore};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    user_id: i64,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: PostId::new(row.id),
            title: row.title,
            content: row.content,
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
        }
    }
}

/// Credential and post store backed by SQLite.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn exists(&self, username: &str) -> StoreResult<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(username)
                .fetch_one(self.db.pool())
                .await?;
        Ok(found)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password) VALUES (?, ?)
             RETURNING id, username, password",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            if StoreError::is_unique_violation(&e) {
                StoreError::DuplicateUsername(username.to_string())
            } else {
                StoreError::Database(e)
            }
        })?;
        debug!(user_id = row.id, username, "user created");
        Ok(row.into())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row =
            sqlx::query_as::<_, UserRow>("SELECT id, username, password FROM users WHERE id = ?")
                .bind(id.get())
                .fetch_optional(self.db.pool())
                .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl PostStore for SqliteStore {
    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let author = post.user_id;
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (title, content, user_id, created_at) VALUES (?, ?, ?, ?)
             RETURNING id, title, content, user_id, created_at",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(author.get())
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            if StoreError::is_foreign_key_violation(&e) {
                StoreError::UnknownUser(author)
            } else {
                StoreError::Database(e)
            }
        })?;
        debug!(post_id = row.id, user_id = row.user_id, "post created");
        Ok(row.into())
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, title, content, user_id, created_at FROM posts WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(Post::from))
    }

    async fn posts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT id, title, content, user_id, created_at FROM posts
             WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id.get())
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn post_exists(&self, id: PostId) -> StoreResult<bool> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
            .bind(id.get())
            .fetch_one(self.db.pool())
            .await?;
        Ok(found)
    }
}
