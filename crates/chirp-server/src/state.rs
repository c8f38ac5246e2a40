use std::sync::Arc;

use chirp_crypto::{CredentialHasher, TokenService};
use chirp_ledger::{InMemoryLikeLedger, LikeLedger, SqliteLikeLedger};
use chirp_store::{CredentialStore, Database, InMemoryStore, PostStore, SqliteStore};
use tracing::info;

use crate::accounts::AccountService;
use crate::config::{ServerConfig, StorageBackend};
use crate::error::ServerResult;

/// The three stores behind the API, plus the database handle when there
/// is one.
#[derive(Clone)]
pub struct Storage {
    pub credentials: Arc<dyn CredentialStore>,
    pub posts: Arc<dyn PostStore>,
    pub likes: Arc<dyn LikeLedger>,
    pub database: Option<Database>,
}

impl Storage {
    /// Open the configured backend. SQLite is migrated before returning.
    pub async fn open(config: &ServerConfig) -> ServerResult<Self> {
        match config.storage {
            StorageBackend::Memory => {
                info!("using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Sqlite => {
                let db = Database::connect(&config.database).await?;
                let version = db.migrate().await?;
                let sqlite = db.sqlite_version().await?;
                info!(url = %config.database.url, schema = version, sqlite = %sqlite, "storage ready");
                Ok(Self::sqlite(db))
            }
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let likes = InMemoryLikeLedger::new(store.clone());
        Self {
            credentials: store.clone(),
            posts: store,
            likes: Arc::new(likes),
            database: None,
        }
    }

    /// Stores over an already migrated database.
    pub fn sqlite(db: Database) -> Self {
        let store = Arc::new(SqliteStore::new(db.clone()));
        Self {
            credentials: store.clone(),
            posts: store,
            likes: Arc::new(SqliteLikeLedger::new(db.clone())),
            database: Some(db),
        }
    }

    pub async fn ping(&self) -> ServerResult<()> {
        if let Some(db) = &self.database {
            db.ping().await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<dyn PostStore>,
    pub likes: Arc<dyn LikeLedger>,
    pub tokens: TokenService,
    pub storage: Storage,
    pub expose_internal_errors: bool,
}

impl AppState {
    pub fn new(config: &ServerConfig, storage: Storage) -> ServerResult<Self> {
        let tokens = TokenService::new(&config.secret_key, config.token_lifetime_secs);
        let hasher = CredentialHasher::new(config.password)?;
        let accounts = AccountService::new(storage.credentials.clone(), hasher, tokens.clone());
        Ok(Self {
            accounts: Arc::new(accounts),
            posts: storage.posts.clone(),
            likes: storage.likes.clone(),
            tokens,
            storage,
            expose_internal_errors: config.expose_internal_errors,
        })
    }
}
