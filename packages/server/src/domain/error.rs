//! Domain error types.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// User ID is empty after trimming
    #[error("User ID cannot be empty")]
    UserIdEmpty,

    /// User ID exceeds the maximum length
    #[error("User ID is too long (max {max} characters, got {actual})")]
    UserIdTooLong { max: usize, actual: usize },
}

/// Credential verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token was supplied with the request
    #[error("token required")]
    MissingToken,

    /// The token has expired
    #[error("token expired")]
    Expired,

    /// The token could not be verified (bad signature, malformed, wrong algorithm)
    #[error("invalid token: {0}")]
    Invalid(String),
}
