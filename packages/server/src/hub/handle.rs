//! Public handle to the hub control loop.

use std::sync::Arc;

use agora_shared::time::Clock;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};

use crate::{
    config::DEFAULT_HUB_COMMAND_CAPACITY,
    domain::{ConnectionId, Message, OnlineUser, UserId},
    infrastructure::codec,
};

use super::{
    actor::HubActor, command::HubCommand, connection::ConnectionHandle, error::HubError,
};

/// Point-in-time view of the membership set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    /// Deduplicated online users in first-seen order
    pub users: Vec<OnlineUser>,
    /// Number of live connections
    pub connections: usize,
}

/// Cloneable handle to the connection registry.
///
/// Created by [`Hub::start`]; the control loop lives until [`Hub::stop`] is
/// called or every handle is dropped.
///
/// # Example
///
/// ```ignore
/// let hub = Hub::start(Arc::new(SystemClock));
/// hub.broadcast(Message::new(MessageType::Vote, json!({"post_id": "p1"}), Utc::now()))?;
/// hub.stop().await?;
/// ```
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<HubCommand>,
}

impl Hub {
    /// Spawn the control loop on the current tokio runtime.
    pub fn start(clock: Arc<dyn Clock>) -> Self {
        Self::start_with_capacity(clock, DEFAULT_HUB_COMMAND_CAPACITY)
    }

    /// Spawn the control loop with a command buffer of `capacity` entries.
    ///
    /// Broadcasts that find the buffer full are dropped; every other command
    /// waits for room.
    pub fn start_with_capacity(clock: Arc<dyn Clock>, capacity: usize) -> Self {
        let (commands, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(HubActor::new(receiver, clock).run());
        Self { commands }
    }

    /// Admit a connection. Resolves once the hub has applied the registration
    /// and sent the resulting presence notifications.
    pub async fn register(&self, connection: ConnectionHandle) -> Result<(), HubError> {
        let (ack, done) = oneshot::channel();
        self.send(HubCommand::Register { connection, ack }).await?;
        done.await.map_err(|_| HubError::Stopped)
    }

    /// Remove a connection if it is still registered.
    ///
    /// Idempotent: returns `Ok(false)` when the connection was already gone.
    pub async fn unregister(&self, id: ConnectionId) -> Result<bool, HubError> {
        let (ack, done) = oneshot::channel();
        self.send(HubCommand::Unregister { id, ack }).await?;
        done.await.map_err(|_| HubError::Stopped)
    }

    /// Fan a message out to every registered connection.
    ///
    /// Fire-and-forget: the message is encoded here, once, and queued for the
    /// control loop. Slow consumers are evicted rather than waited for.
    pub fn broadcast(&self, message: Message) -> Result<(), HubError> {
        let frame = codec::encode(&message)?;
        tracing::debug!("Queueing {} broadcast", message.kind);
        self.try_send(HubCommand::Broadcast { frame })
    }

    /// Fan a message out to every connection of one logical user.
    pub fn broadcast_to_user(&self, user_id: &UserId, message: Message) -> Result<(), HubError> {
        let frame = codec::encode(&message)?;
        tracing::debug!("Queueing {} for user {}", message.kind, user_id);
        self.try_send(HubCommand::BroadcastToUser {
            user_id: user_id.clone(),
            frame,
        })
    }

    pub async fn snapshot(&self) -> Result<PresenceSnapshot, HubError> {
        let (reply, answer) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply }).await?;
        answer.await.map_err(|_| HubError::Stopped)
    }

    /// Deduplicated list of online users.
    pub async fn online_users(&self) -> Result<Vec<OnlineUser>, HubError> {
        Ok(self.snapshot().await?.users)
    }

    /// Number of distinct online users.
    pub async fn online_count(&self) -> Result<usize, HubError> {
        Ok(self.snapshot().await?.users.len())
    }

    /// Number of live connections, counting every tab.
    pub async fn connection_count(&self) -> Result<usize, HubError> {
        Ok(self.snapshot().await?.connections)
    }

    /// Close every outbound queue and stop the control loop.
    pub async fn stop(&self) -> Result<(), HubError> {
        let (ack, done) = oneshot::channel();
        self.send(HubCommand::Shutdown { ack }).await?;
        done.await.map_err(|_| HubError::Stopped)
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Queue a fan-out without waiting; dropped when the control loop is behind.
    fn try_send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => {
                tracing::warn!("Hub command buffer full, dropping broadcast");
                HubError::Overloaded
            }
            TrySendError::Closed(_) => HubError::Stopped,
        })
    }
}
