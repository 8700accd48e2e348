//! Wire codec for live-update frames.
//!
//! A message is serialized exactly once per fan-out; the resulting [`Frame`]
//! is shared by every recipient's outbound queue.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::Message;

use super::dto::websocket::WireMessage;

/// Serialized, immutable frame shared across outbound queues
pub type Frame = Arc<str>;

/// Separator used when several frames are coalesced into one transport write
pub const BATCH_SEPARATOR: char = '\n';

#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame is not a valid JSON message
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame has no usable type tag
    #[error("frame has an empty type tag")]
    MissingType,
}

/// Serialize a message into a shareable frame.
pub fn encode(message: &Message) -> Result<Frame, CodecError> {
    let json = serde_json::to_string(&WireMessage::from(message))?;
    Ok(Frame::from(json))
}

/// Decode one inbound frame.
///
/// `received_at` is used when the frame carries no timestamp.
pub fn decode(text: &str, received_at: DateTime<Utc>) -> Result<Message, CodecError> {
    let wire: WireMessage = serde_json::from_str(text)?;
    wire.into_domain(received_at).ok_or(CodecError::MissingType)
}

/// Join frames into one batched payload, preserving order.
pub fn join_batch(frames: &[Frame]) -> String {
    let capacity = frames.iter().map(|f| f.len() + 1).sum();
    let mut batch = String::with_capacity(capacity);
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 {
            batch.push(BATCH_SEPARATOR);
        }
        batch.push_str(frame);
    }
    batch
}

/// Split a batched payload back into its frames, skipping blank parts.
pub fn split_batch(payload: &str) -> impl Iterator<Item = &str> {
    payload
        .split(BATCH_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
}
