//! Registry entry and per-connection outbound queue.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{
    domain::{ConnectionId, Identity, UserId},
    infrastructure::codec::Frame,
};

/// Reason a frame could not be queued for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The consumer is too slow and its queue is at capacity
    Full,
    /// The session side of the queue is gone
    Closed,
}

/// Hub-side membership entry for one connection.
///
/// Holds the only sender of the connection's outbound queue, so dropping the
/// entry closes the queue.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub username: String,
    sender: mpsc::Sender<Frame>,
}

/// Session-side end of a connection's bounded outbound queue
#[derive(Debug)]
pub struct OutboundQueue {
    receiver: mpsc::Receiver<Frame>,
}

impl ConnectionHandle {
    /// Create a registry entry and its outbound queue.
    ///
    /// `capacity` is clamped to at least one frame.
    pub fn new(identity: &Identity, capacity: usize) -> (Self, OutboundQueue) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::generate(),
            user_id: identity.user_id.clone(),
            username: identity.username.clone(),
            sender,
        };
        (handle, OutboundQueue { receiver })
    }

    /// Queue a frame without waiting.
    pub fn try_push(&self, frame: Frame) -> Result<(), PushError> {
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => PushError::Full,
            TrySendError::Closed(_) => PushError::Closed,
        })
    }
}

impl OutboundQueue {
    /// Wait for the next frame; `None` once the hub has closed the queue and it is drained.
    pub async fn pop(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    /// Take a frame that is already queued, if any.
    pub fn try_pop(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }
}
