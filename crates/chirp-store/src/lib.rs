//! Storage layer for chirp.
//!
//! Owns the SQLite connection pool and the tables for users and posts. The
//! `likes` table is created here too, as part of the single schema, but its
//! rows belong to `chirp-ledger`.
//!
//! # Backends
//!
//! Both stores are traits with two implementations:
//!
//! - [`SqliteStore`] -- sqlx over a [`Database`] handle
//! - [`InMemoryStore`] -- `BTreeMap`s behind a `RwLock`, for tests and embedding
//!
//! # Design Rules
//!
//! 1. The pool is an injected handle, never a global. It is opened with
//!    [`Database::connect`], migrated with [`Database::migrate`] and closed
//!    with [`Database::close`].
//! 2. Connections are acquired per operation and returned to the pool on
//!    every exit path (sqlx guards are RAII).
//! 3. Uniqueness and referential integrity are enforced by the schema; the
//!    stores translate constraint violations into typed errors.

pub mod database;
pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use database::{Database, DatabaseConfig};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CredentialStore, PostStore};
