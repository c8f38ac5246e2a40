use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::UserId;

/// Longest username accepted at signup.
pub const MAX_USERNAME_LEN: usize = 32;

/// A registered account.
///
/// The password hash never leaves the server: it is skipped on
/// serialization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Normalize and validate a username, returning the trimmed form.
pub fn validate_username(raw: &str) -> Result<String, TypeError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(TypeError::EmptyUsername);
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(TypeError::UsernameTooLong {
            max: MAX_USERNAME_LEN,
        });
    }
    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(TypeError::InvalidUsernameChar(bad));
    }
    Ok(username.to_string())
}

pub fn validate_password(raw: &str) -> Result<(), TypeError> {
    if raw.is_empty() {
        return Err(TypeError::EmptyPassword);
    }
    Ok(())
}
