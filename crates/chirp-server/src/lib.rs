//! HTTP server for chirp.
//!
//! Serves signup/login, posts, and the like ledger as JSON over axum.
//! Identity comes from a raw token in the `authorization` header; every
//! endpoint that acts for a user takes the acting id from that token.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use accounts::AccountService;
pub use auth::{authenticate, Identity};
pub use config::{ServerConfig, StorageBackend, DEVELOPMENT_SECRET};
pub use error::{ServerError, ServerResult, GENERIC_INTERNAL_MESSAGE};
pub use router::build_router;
pub use server::ChirpServer;
pub use state::{AppState, Storage};
