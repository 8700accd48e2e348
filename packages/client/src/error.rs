//! Error types for the terminal client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the token; retrying cannot help
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The connection could not be established
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Reconnection attempts were exhausted
    #[error("Gave up after {0} reconnection attempts")]
    RetriesExhausted(u32),
}

/// Reasons an input line cannot be sent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("empty input")]
    Empty,

    /// Only interaction events are relayed by the server
    #[error("'{0}' cannot be sent (use typing, stop_typing, vote, comment or reply)")]
    UnsupportedType(String),

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
}
