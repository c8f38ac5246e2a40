use chirp_types::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Tokens stay valid for 24 hours after issuance.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// What an identity token asserts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub username: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Errors from issuing or verifying identity tokens.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token encoding failed: {0}")]
    Encode(String),
}

/// Issues and verifies HS256 identity tokens.
///
/// Tokens are presented raw in the `authorization` header, without a
/// scheme prefix.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issue a token for a user, valid from now.
    pub fn issue(&self, id: UserId, username: &str) -> Result<String, TokenError> {
        self.issue_at(id, username, Utc::now())
    }

    /// Issue a token as if it were minted at `issued_at`.
    pub fn issue_at(
        &self,
        id: UserId,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            id,
            username: username.to_string(),
            iat,
            exp: iat + self.lifetime_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token.trim(), &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}
