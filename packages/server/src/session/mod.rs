//! Client session: one authenticated WebSocket connection attached to the hub.
//!
//! A session registers a connection with the hub, then runs two pumps
//! concurrently. The read pump relays inbound interaction events; the write
//! pump drains the connection's outbound queue. Whichever pump ends first ends
//! the session, and the connection is unregistered exactly once on the way out.

mod dispatch;
mod inbound;
mod outbound;
mod state;

use std::sync::Arc;

use agora_shared::time::Clock;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::StreamExt;
use tokio::time;

use crate::{
    config::SessionConfig,
    domain::{ConnectionId, Identity},
    hub::{ConnectionHandle, Hub},
};

pub use state::SessionState;

use inbound::InboundContext;
use outbound::OutboundSettings;
use state::Lifecycle;

/// Why one side of a session stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpExit {
    /// The peer sent a close frame
    PeerClosed,
    /// The socket stream ended without a close frame
    StreamEnded,
    ReadError(String),
    /// Nothing arrived within the pong wait
    ReadTimeout,
    /// The hub refused a broadcast because it has stopped
    HubStopped,
    /// The hub closed the outbound queue (unregistered, evicted or shut down)
    QueueClosed,
    WriteError(String),
    WriteTimeout,
}

pub struct ClientSession {
    identity: Identity,
    hub: Hub,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl ClientSession {
    pub fn new(identity: Identity, hub: Hub, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        Self {
            identity,
            hub,
            clock,
            config,
        }
    }

    /// Drive the connection until either side gives up.
    pub async fn run(self, mut socket: WebSocket) {
        let (handle, queue) = ConnectionHandle::new(&self.identity, self.config.queue_capacity);
        let connection_id = handle.id;
        let mut lifecycle = Lifecycle::new(connection_id);

        if let Err(e) = self.hub.register(handle).await {
            tracing::error!(
                "Failed to register connection {} for {} ({}): {}",
                connection_id,
                self.identity.username,
                self.identity.user_id,
                e
            );
            lifecycle.advance(SessionState::Closing);
            let _ = socket.send(WsMessage::Close(None)).await;
            lifecycle.advance(SessionState::Closed);
            return;
        }
        lifecycle.advance(SessionState::Open);

        let (sink, stream) = socket.split();
        let mut write_task = tokio::spawn(outbound::write_pump(
            sink,
            queue,
            OutboundSettings {
                write_timeout: self.config.write_timeout,
                ping_period: self.config.ping_period,
            },
        ));
        let mut read_task = tokio::spawn(inbound::read_pump(
            stream,
            InboundContext {
                connection_id,
                identity: self.identity.clone(),
                hub: self.hub.clone(),
                clock: self.clock.clone(),
                pong_wait: self.config.pong_wait,
            },
        ));

        tokio::select! {
            exit = &mut write_task => {
                lifecycle.advance(SessionState::Closing);
                read_task.abort();
                tracing::info!("Connection {}: write side ended: {:?}", connection_id, exit);
                self.unregister(connection_id).await;
            }
            exit = &mut read_task => {
                lifecycle.advance(SessionState::Closing);
                tracing::info!("Connection {}: read side ended: {:?}", connection_id, exit);
                // Unregistering closes the queue, which lets the write pump
                // flush what is left and send a close frame.
                self.unregister(connection_id).await;
                if time::timeout(self.config.write_timeout, &mut write_task).await.is_err() {
                    tracing::debug!("Connection {}: write side did not finish, aborting", connection_id);
                    write_task.abort();
                }
            }
        }

        lifecycle.advance(SessionState::Closed);
        tracing::info!(
            "Connection {} for {} ({}) is {}",
            connection_id,
            self.identity.username,
            self.identity.user_id,
            lifecycle.state()
        );
    }

    async fn unregister(&self, connection_id: ConnectionId) {
        match self.hub.unregister(connection_id).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Connection {} was already removed by the hub", connection_id),
            Err(e) => tracing::warn!("Failed to unregister connection {}: {}", connection_id, e),
        }
    }
}
