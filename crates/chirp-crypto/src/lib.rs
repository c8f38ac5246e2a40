//! Credential primitives for chirp.
//!
//! Provides salted argon2id password hashing and HS256-signed identity
//! tokens carrying `{id, username}` with a fixed lifetime.
//!
//! All crypto operations wrap established libraries.

pub mod error;
pub mod password;
pub mod token;

pub use error::CryptoError;
pub use password::{CredentialHasher, HashCost};
pub use token::{Claims, TokenError, TokenService, DEFAULT_TOKEN_LIFETIME_SECS};
