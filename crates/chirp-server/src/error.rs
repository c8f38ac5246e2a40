use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chirp_crypto::{CryptoError, TokenError};
use chirp_ledger::LedgerError;
use chirp_store::StoreError;
use chirp_types::{PostId, TypeError, UserId};
use serde_json::json;
use thiserror::Error;

/// Body of every 500 unless raw errors are exposed.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong, please try again later!";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(#[from] TypeError),

    #[error("Username already exists.")]
    DuplicateUsername(String),

    #[error("User does not exist")]
    UnknownUser(UserId),

    #[error("Post does not exist")]
    UnknownPost(PostId),

    #[error("Username or password incorrect")]
    UnknownUsername,

    #[error("Username or password incorrect")]
    BadPassword,

    #[error("Access Denied")]
    MissingToken,

    #[error("Invalid Token")]
    InvalidToken(TokenError),

    #[error("acting user does not match the authenticated user")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(name) => Self::DuplicateUsername(name),
            StoreError::UnknownUser(id) => Self::UnknownUser(id),
            other => Self::Store(other),
        }
    }
}

impl From<TokenError> for ServerError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(reason) => Self::Internal(reason),
            other => Self::InvalidToken(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::DuplicateUsername(_)
            | Self::UnknownUser(_)
            | Self::UnknownPost(_)
            | Self::UnknownUsername
            | Self::InvalidToken(_) => StatusCode::BAD_REQUEST,
            Self::MissingToken | Self::BadPassword => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_)
            | Self::Ledger(_)
            | Self::Crypto(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Raw text of a 500, attached to the response so the router can decide
/// whether to reveal it.
#[derive(Clone, Debug)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::BadPassword => {
                (status, Json(json!({ "auth": false, "token": null }))).into_response()
            }
            err if status.is_server_error() => {
                tracing::error!(error = %err, "request failed");
                let mut response =
                    (status, Json(json!({ "error": GENERIC_INTERNAL_MESSAGE }))).into_response();
                response
                    .extensions_mut()
                    .insert(InternalErrorDetail(err.to_string()));
                response
            }
            err => (status, Json(json!({ "error": err.to_string() }))).into_response(),
        }
    }
}
