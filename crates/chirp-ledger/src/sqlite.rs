use async_trait::async_trait;
use chirp_store::Database;
use chirp_types::{LikeEvent, LikeId, Liker, PostId, UserId};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::traits::{LikeReader, LikeWriter};

const LIKE_COLUMNS: &str = "id, user_id, post_id, created_at, active";

#[derive(sqlx::FromRow)]
struct LikeRow {
    id: i64,
    user_id: i64,
    post_id: i64,
    created_at: DateTime<Utc>,
    active: bool,
}

impl From<LikeRow> for LikeEvent {
    fn from(row: LikeRow) -> Self {
        Self {
            id: LikeId::new(row.id),
            user_id: UserId::new(row.user_id),
            post_id: PostId::new(row.post_id),
            created_at: row.created_at,
            state: row.active.into(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct LikerRow {
    username: String,
    user_id: i64,
    likes_id: i64,
}

impl From<LikerRow> for Liker {
    fn from(row: LikerRow) -> Self {
        Self {
            username: row.username,
            user_id: UserId::new(row.user_id),
            like_id: LikeId::new(row.likes_id),
        }
    }
}

/// Like ledger stored in the `likes` table.
///
/// Toggle runs in a transaction whose first statement is a write, so it
/// holds SQLite's write lock from the start and concurrent toggles queue
/// behind it (bounded by the pool's busy timeout). The partial unique index
/// `idx_likes_one_active` backs the invariant at the storage level.
#[derive(Clone, Debug)]
pub struct SqliteLikeLedger {
    db: Database,
}

impl SqliteLikeLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn switch_off(
        conn: &mut SqliteConnection,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<LikeEvent>, sqlx::Error> {
        let row = sqlx::query_as::<_, LikeRow>(&format!(
            "UPDATE likes SET active = 0
             WHERE user_id = ? AND post_id = ? AND active = 1
             RETURNING {LIKE_COLUMNS}"
        ))
        .bind(user_id.get())
        .bind(post_id.get())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(LikeEvent::from))
    }

    async fn reactivate(
        conn: &mut SqliteConnection,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<LikeEvent>, sqlx::Error> {
        let row = sqlx::query_as::<_, LikeRow>(&format!(
            "UPDATE likes SET active = 1
             WHERE id = (
                 SELECT id FROM likes
                 WHERE user_id = ? AND post_id = ? AND active = 0
                 ORDER BY id LIMIT 1
             )
             RETURNING {LIKE_COLUMNS}"
        ))
        .bind(user_id.get())
        .bind(post_id.get())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(LikeEvent::from))
    }

    async fn insert_active(
        conn: &mut SqliteConnection,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<LikeEvent, sqlx::Error> {
        let row = sqlx::query_as::<_, LikeRow>(&format!(
            "INSERT INTO likes (user_id, post_id, created_at, active)
             VALUES (?, ?, ?, 1)
             RETURNING {LIKE_COLUMNS}"
        ))
        .bind(user_id.get())
        .bind(post_id.get())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.into())
    }
}

fn map_write_error(err: sqlx::Error, user_id: UserId, post_id: PostId) -> LedgerError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => LedgerError::InvariantViolation {
            user_id,
            post_id,
            reason: "a second active like was rejected by the store".into(),
        },
        _ => LedgerError::Database(err),
    }
}

#[async_trait]
impl LikeWriter for SqliteLikeLedger {
    async fn toggle(&self, user_id: UserId, post_id: PostId) -> LedgerResult<LikeEvent> {
        // Dropping `tx` on an early return rolls back and releases the
        // connection.
        let mut tx = self.db.pool().begin().await?;
        let event = match Self::switch_off(&mut *tx, user_id, post_id).await {
            Ok(Some(event)) => event,
            Ok(None) => match Self::reactivate(&mut *tx, user_id, post_id).await {
                Ok(Some(event)) => event,
                Ok(None) => Self::insert_active(&mut *tx, user_id, post_id)
                    .await
                    .map_err(|e| map_write_error(e, user_id, post_id))?,
                Err(e) => return Err(map_write_error(e, user_id, post_id)),
            },
            Err(e) => return Err(map_write_error(e, user_id, post_id)),
        };
        tx.commit().await?;

        debug!(
            like_id = %event.id,
            user_id = %user_id,
            post_id = %post_id,
            state = %event.state,
            "like toggled"
        );
        Ok(event)
    }

    async fn deactivate(&self, user_id: UserId, post_id: PostId) -> LedgerResult<bool> {
        // A single UPDATE is its own atomic unit.
        let result =
            sqlx::query("UPDATE likes SET active = 0 WHERE user_id = ? AND post_id = ? AND active = 1")
                .bind(user_id.get())
                .bind(post_id.get())
                .execute(self.db.pool())
                .await?;
        let changed = result.rows_affected() > 0;
        debug!(user_id = %user_id, post_id = %post_id, changed, "like deactivated");
        Ok(changed)
    }
}

#[async_trait]
impl LikeReader for SqliteLikeLedger {
    async fn list_likers(&self, post_id: PostId) -> LedgerResult<Vec<Liker>> {
        let rows = sqlx::query_as::<_, LikerRow>(
            "SELECT users.username, users.id AS user_id, likes.id AS likes_id
             FROM likes
             INNER JOIN users ON likes.user_id = users.id
             WHERE likes.post_id = ? AND likes.active = 1
             ORDER BY likes.id",
        )
        .bind(post_id.get())
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().map(Liker::from).collect())
    }

    async fn like_count(&self, post_id: PostId) -> LedgerResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ? AND active = 1")
                .bind(post_id.get())
                .fetch_one(self.db.pool())
                .await?;
        Ok(count as u64)
    }

    async fn is_liking(&self, user_id: UserId, post_id: PostId) -> LedgerResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM likes WHERE user_id = ? AND post_id = ? AND active = 1
             )",
        )
        .bind(user_id.get())
        .bind(post_id.get())
        .fetch_one(self.db.pool())
        .await?;
        Ok(found)
    }

    async fn history(&self, user_id: UserId, post_id: PostId) -> LedgerResult<Vec<LikeEvent>> {
        let rows = sqlx::query_as::<_, LikeRow>(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes WHERE user_id = ? AND post_id = ? ORDER BY id"
        ))
        .bind(user_id.get())
        .bind(post_id.get())
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().map(LikeEvent::from).collect())
    }

    async fn events_for_post(&self, post_id: PostId) -> LedgerResult<Vec<LikeEvent>> {
        let rows = sqlx::query_as::<_, LikeRow>(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes WHERE post_id = ? ORDER BY id"
        ))
        .bind(post_id.get())
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().map(LikeEvent::from).collect())
    }

    async fn liked_posts(&self) -> LedgerResult<Vec<PostId>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT DISTINCT post_id FROM likes ORDER BY post_id")
            .fetch_all(self.db.pool())
            .await?;
        Ok(ids.into_iter().map(PostId::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chirp_store::{CredentialStore, DatabaseConfig, PostStore, SqliteStore};
    use chirp_types::{LikeState, NewPost};

    use super::*;
    use crate::validation::LikeValidator;

    struct Fixture {
        ledger: SqliteLikeLedger,
        store: SqliteStore,
        alice: UserId,
        post: PostId,
    }

    async fn setup(db: Database) -> Fixture {
        let store = SqliteStore::new(db.clone());
        let alice = store.create_user("alice", "h").await.unwrap().id;
        let post = store
            .create_post(NewPost::new(alice, "hello", "world"))
            .await
            .unwrap()
            .id;
        Fixture {
            ledger: SqliteLikeLedger::new(db),
            store,
            alice,
            post,
        }
    }

    async fn fixture() -> Fixture {
        setup(Database::open_in_memory().await.unwrap()).await
    }

    #[tokio::test]
    async fn first_toggle_inserts_active_row() {
        let f = fixture().await;
        let like = f.ledger.toggle(f.alice, f.post).await.unwrap();
        assert_eq!(like.user_id, f.alice);
        assert_eq!(like.post_id, f.post);
        assert_eq!(like.state, LikeState::Active);
        assert!(f.ledger.is_liking(f.alice, f.post).await.unwrap());
    }

    #[tokio::test]
    async fn like_unlike_like_reuses_row() {
        let f = fixture().await;
        let liked = f.ledger.toggle(f.alice, f.post).await.unwrap();

        assert!(f.ledger.deactivate(f.alice, f.post).await.unwrap());
        let history = f.ledger.history(f.alice, f.post).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, liked.id);
        assert_eq!(history[0].state, LikeState::Inactive);

        let again = f.ledger.toggle(f.alice, f.post).await.unwrap();
        assert_eq!(again.id, liked.id);
        assert_eq!(again.created_at, liked.created_at);
        assert_eq!(again.state, LikeState::Active);
        assert_eq!(f.ledger.history(f.alice, f.post).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toggle_is_symmetric() {
        let f = fixture().await;
        let on = f.ledger.toggle(f.alice, f.post).await.unwrap();
        let off = f.ledger.toggle(f.alice, f.post).await.unwrap();
        assert_eq!(off.id, on.id);
        assert_eq!(off.state, LikeState::Inactive);
        assert_eq!(f.ledger.like_count(f.post).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deactivate_without_active_row_is_noop() {
        let f = fixture().await;
        assert!(!f.ledger.deactivate(f.alice, f.post).await.unwrap());
        assert!(f.ledger.history(f.alice, f.post).await.unwrap().is_empty());

        f.ledger.toggle(f.alice, f.post).await.unwrap();
        f.ledger.deactivate(f.alice, f.post).await.unwrap();
        let before = f.ledger.history(f.alice, f.post).await.unwrap();
        assert!(!f.ledger.deactivate(f.alice, f.post).await.unwrap());
        assert_eq!(f.ledger.history(f.alice, f.post).await.unwrap(), before);
    }

    #[tokio::test]
    async fn likers_exclude_inactive_rows() {
        let f = fixture().await;
        let bob = f.store.create_user("bob", "h").await.unwrap().id;
        assert!(f.ledger.list_likers(f.post).await.unwrap().is_empty());

        let alice_like = f.ledger.toggle(f.alice, f.post).await.unwrap();
        f.ledger.toggle(bob, f.post).await.unwrap();
        f.ledger.deactivate(bob, f.post).await.unwrap();

        let likers = f.ledger.list_likers(f.post).await.unwrap();
        assert_eq!(
            likers,
            vec![Liker {
                username: "alice".into(),
                user_id: f.alice,
                like_id: alice_like.id,
            }]
        );
        assert_eq!(f.ledger.like_count(f.post).await.unwrap(), 1);
        assert_eq!(f.ledger.liked_posts().await.unwrap(), vec![f.post]);
        assert_eq!(f.ledger.events_for_post(f.post).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_post_is_a_storage_error() {
        let f = fixture().await;
        let err = f.ledger.toggle(f.alice, PostId::new(404)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
        assert!(f.ledger.liked_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_active_row_rejected_by_schema() {
        let f = fixture().await;
        f.ledger.toggle(f.alice, f.post).await.unwrap();
        let err = sqlx::query(
            "INSERT INTO likes (user_id, post_id, created_at, active) VALUES (?, ?, ?, 1)",
        )
        .bind(f.alice.get())
        .bind(f.post.get())
        .bind(Utc::now())
        .execute(f.ledger.db.pool())
        .await
        .unwrap_err();
        assert!(matches!(err, sqlx::Error::Database(ref db) if db.is_unique_violation()));
    }

    #[tokio::test]
    async fn legacy_duplicate_inactive_rows_reactivate_oldest() {
        let f = fixture().await;
        for _ in 0..2 {
            sqlx::query(
                "INSERT INTO likes (user_id, post_id, created_at, active) VALUES (?, ?, ?, 0)",
            )
            .bind(f.alice.get())
            .bind(f.post.get())
            .bind(Utc::now())
            .execute(f.ledger.db.pool())
            .await
            .unwrap();
        }
        let history = f.ledger.history(f.alice, f.post).await.unwrap();
        let like = f.ledger.toggle(f.alice, f.post).await.unwrap();
        assert_eq!(like.id, history[0].id);
        assert_eq!(f.ledger.like_count(f.post).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_toggles_keep_one_active_row() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("likes.db").display()),
            max_connections: 4,
            busy_timeout_ms: 10_000,
        };
        let db = Database::connect(&config).await.unwrap();
        db.migrate().await.unwrap();
        let f = setup(db).await;
        let ledger = Arc::new(f.ledger.clone());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = ledger.clone();
            let (user, post) = (f.alice, f.post);
            handles.push(tokio::spawn(async move { ledger.toggle(user, post).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let history = ledger.history(f.alice, f.post).await.unwrap();
        assert_eq!(history.len(), 1);
        // An even number of flips lands back on inactive.
        assert_eq!(history[0].state, LikeState::Inactive);
        assert_eq!(ledger.like_count(f.post).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_toggles_and_unlikes_across_users() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("likes.db").display()),
            max_connections: 8,
            busy_timeout_ms: 10_000,
        };
        let db = Database::connect(&config).await.unwrap();
        db.migrate().await.unwrap();
        let f = setup(db).await;
        let bob = f.store.create_user("bob", "h").await.unwrap().id;
        let carol = f.store.create_user("carol", "h").await.unwrap().id;
        let users = [f.alice, bob, carol];
        let ledger = Arc::new(f.ledger.clone());

        let mut handles = Vec::new();
        for i in 0..60 {
            let ledger = ledger.clone();
            let (user, post) = (users[i % users.len()], f.post);
            handles.push(tokio::spawn(async move {
                if i % 4 == 3 {
                    ledger.deactivate(user, post).await.map(|_| ())
                } else {
                    ledger.toggle(user, post).await.map(|_| ())
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for user in users {
            let history = ledger.history(user, f.post).await.unwrap();
            assert_eq!(history.len(), 1);
        }
        let report = LikeValidator::audit_post(ledger.as_ref(), f.post).await.unwrap();
        assert!(report.is_valid(), "{:?}", report.violations);
        assert_eq!(report.event_count, 3);
        assert_eq!(
            report.active_count as u64,
            ledger.like_count(f.post).await.unwrap()
        );
    }
}
