use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::schema::{latest_version, MIGRATIONS};

/// Connection settings for the SQLite backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://chirp.db".into(),
            max_connections: 4,
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    /// A private in-memory database. Lives as long as the pool.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Handle to the storage backend.
///
/// Cheap to clone; every clone shares one pool. Open it once at startup,
/// run [`Database::migrate`], and call [`Database::close`] on shutdown.
#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        // Each connection to `:memory:` is its own database, so the pool
        // must hold exactly one connection and never recycle it.
        let pool = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .connect_with(opts)
                .await?
        };

        debug!(url = %config.url, "database pool opened");
        Ok(Self { pool })
    }

    /// Open an in-memory database and migrate it.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let db = Self::connect(&DatabaseConfig::in_memory()).await?;
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Apply pending migrations. Safe to call on every startup.
    pub async fn migrate(&self) -> StoreResult<i64> {
        let current = self.schema_version().await?;
        for (index, statements) in MIGRATIONS.iter().enumerate() {
            let version = index as i64 + 1;
            if version <= current {
                continue;
            }
            let mut tx = self.pool.begin().await?;
            for statement in statements.iter().copied() {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StoreError::Migration {
                        version,
                        reason: e.to_string(),
                    })?;
            }
            sqlx::query(&format!("PRAGMA user_version = {version}"))
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            info!(version, "applied schema migration");
        }
        Ok(latest_version().max(current))
    }

    pub async fn schema_version(&self) -> StoreResult<i64> {
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    /// Version string of the linked SQLite library.
    pub async fn sqlite_version(&self) -> StoreResult<String> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
