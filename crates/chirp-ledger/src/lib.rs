//! Like ledger for chirp.
//!
//! A like is one logical boolean per (user, post), stored as a
//! [`LikeEvent`](chirp_types::LikeEvent) row that flips between active and
//! inactive and is never deleted. This crate provides:
//! - `LikeWriter` / `LikeReader` trait boundaries
//! - `SqliteLikeLedger`, where each toggle is one database transaction
//! - `InMemoryLikeLedger` for tests and embedding
//! - `LikeValidator`, which audits the at-most-one-active invariant
//!
//! # Toggle
//!
//! `toggle(user, post)` is symmetric and atomic:
//! 1. an active row exists: flip it inactive;
//! 2. otherwise an inactive row exists: flip the oldest one active, keeping
//!    its id and `created_at`;
//! 3. otherwise insert a new active row.
//!
//! The ledger never checks that the user or post exists. Callers (or the
//! schema's foreign keys) own referential validity.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;
pub mod validation;

pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLikeLedger;
pub use sqlite::SqliteLikeLedger;
pub use traits::{LikeLedger, LikeReader, LikeWriter};
pub use validation::{LikeAuditReport, LikeValidator, Violation, ViolationKind};
