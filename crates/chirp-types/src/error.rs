use thiserror::Error;

/// Errors produced while validating user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("username is longer than {max} characters")]
    UsernameTooLong { max: usize },

    #[error("username contains invalid character {0:?}")]
    InvalidUsernameChar(char),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("post must have a title or content")]
    EmptyPost,

    #[error("{field} is longer than {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}
