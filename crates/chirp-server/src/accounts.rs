use std::sync::Arc;

use chirp_crypto::{CredentialHasher, TokenService};
use chirp_store::CredentialStore;
use chirp_types::{validate_password, validate_username, User};
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Signup, credential verification, and token issuance.
///
/// Argon2 work runs on the blocking pool so it never stalls the reactor.
pub struct AccountService {
    users: Arc<dyn CredentialStore>,
    hasher: CredentialHasher,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(users: Arc<dyn CredentialStore>, hasher: CredentialHasher, tokens: TokenService) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn users(&self) -> &Arc<dyn CredentialStore> {
        &self.users
    }

    pub async fn signup(&self, username: &str, password: &str) -> ServerResult<User> {
        let username = validate_username(username)?;
        validate_password(password)?;

        if self.users.exists(&username).await? {
            return Err(ServerError::DuplicateUsername(username));
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;

        // The unique constraint still catches a racing signup.
        let user = self.users.create_user(&username, &hash).await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Check a username/password pair.
    pub async fn verify(&self, username: &str, password: &str) -> ServerResult<User> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(ServerError::UnknownUsername)?;

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;

        if !valid {
            warn!(user_id = %user.id, "wrong password");
            return Err(ServerError::BadPassword);
        }
        Ok(user)
    }

    /// Verify credentials and issue a token.
    pub async fn login(&self, username: &str, password: &str) -> ServerResult<(User, String)> {
        let user = self.verify(username, password).await?;
        let token = self.tokens.issue(user.id, &user.username)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }
}
