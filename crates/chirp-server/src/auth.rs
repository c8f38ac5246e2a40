use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chirp_crypto::{Claims, TokenError, TokenService};
use chirp_types::UserId;
use tracing::warn;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// The verified caller of a request.
///
/// Extracting an `Identity` requires a valid token in the `authorization`
/// header (raw, no scheme prefix). Handlers that act on behalf of a user
/// take the acting id from here, never from the request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

impl Identity {
    /// Check a client-supplied user id against the token.
    ///
    /// Absent ids are fine; present ones must match.
    pub fn acting_as(&self, claimed: Option<UserId>) -> ServerResult<UserId> {
        match claimed {
            Some(id) if id != self.user_id => {
                warn!(token_user = %self.user_id, claimed = %id, "acting user mismatch");
                Err(ServerError::Forbidden)
            }
            _ => Ok(self.user_id),
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.id,
            username: claims.username,
        }
    }
}

/// Read and verify the token in `headers`.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> ServerResult<Identity> {
    let raw = headers.get(AUTHORIZATION).ok_or(ServerError::MissingToken)?;
    let token = raw
        .to_str()
        .map_err(|_| ServerError::InvalidToken(TokenError::Invalid("non-ascii header".into())))?
        .trim();
    if token.is_empty() {
        return Err(ServerError::MissingToken);
    }
    tokens.verify(token).map(Identity::from).map_err(|e| {
        warn!(reason = %e, "token rejected");
        ServerError::from(e)
    })
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.tokens)
    }
}
