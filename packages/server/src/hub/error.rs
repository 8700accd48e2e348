//! Hub error types.

use thiserror::Error;

use crate::infrastructure::codec::CodecError;

#[derive(Debug, Error)]
pub enum HubError {
    /// The control loop has been stopped (or crashed); no further commands are accepted
    #[error("hub is not running")]
    Stopped,

    /// The command buffer is full; the broadcast was dropped
    #[error("hub is overloaded, broadcast dropped")]
    Overloaded,

    /// The message could not be serialized
    #[error("failed to encode message: {0}")]
    Encode(#[from] CodecError),
}
