//! Hub control loop.
//!
//! Owns the membership set. Every mutation and every "first / last connection
//! for this user" decision happens here, one command at a time.

use std::sync::Arc;

use agora_shared::time::Clock;
use indexmap::IndexMap;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, Message, OnlineUser, UserId,
        presence::{build_online_users, count_connections_for},
    },
    infrastructure::codec::{self, Frame},
};

use super::{
    command::HubCommand,
    connection::{ConnectionHandle, PushError},
    handle::PresenceSnapshot,
};

/// Recipients of one fan-out
enum Target {
    All,
    User(UserId),
}

impl Target {
    fn matches(&self, connection: &ConnectionHandle) -> bool {
        match self {
            Self::All => true,
            Self::User(user_id) => &connection.user_id == user_id,
        }
    }
}

pub(super) struct HubActor {
    /// Registration order is kept so presence is first-seen ordered
    members: IndexMap<ConnectionId, ConnectionHandle>,
    commands: mpsc::Receiver<HubCommand>,
    clock: Arc<dyn Clock>,
}

impl HubActor {
    pub(super) fn new(commands: mpsc::Receiver<HubCommand>, clock: Arc<dyn Clock>) -> Self {
        Self {
            members: IndexMap::new(),
            commands,
            clock,
        }
    }

    pub(super) async fn run(mut self) {
        tracing::info!("Hub control loop started");

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { connection, ack } => {
                    self.register(connection);
                    let _ = ack.send(());
                }
                HubCommand::Unregister { id, ack } => {
                    let removed = self.remove(id);
                    let _ = ack.send(removed);
                }
                HubCommand::Broadcast { frame } => {
                    self.fan_out(&frame, &Target::All);
                }
                HubCommand::BroadcastToUser { user_id, frame } => {
                    self.fan_out(&frame, &Target::User(user_id));
                }
                HubCommand::Snapshot { reply } => {
                    let _ = reply.send(PresenceSnapshot {
                        users: self.online_users(),
                        connections: self.members.len(),
                    });
                }
                HubCommand::Shutdown { ack } => {
                    tracing::info!(
                        "Hub shutting down, closing {} connection(s)",
                        self.members.len()
                    );
                    self.commands.close();
                    self.members.clear();
                    let _ = ack.send(());
                    break;
                }
            }
        }

        tracing::info!("Hub control loop stopped");
    }

    fn register(&mut self, connection: ConnectionHandle) {
        let previous = self.connections_for(&connection.user_id);
        let user = OnlineUser::new(connection.user_id.clone(), connection.username.clone());
        let id = connection.id;

        if self.members.insert(id, connection).is_some() {
            tracing::warn!("Connection {} registered twice, entry replaced", id);
        }

        tracing::info!(
            "User joined: {} ({}) connection={} user_connections={} total_connections={}",
            user.username,
            user.id,
            id,
            previous + 1,
            self.members.len()
        );

        // The snapshot goes to the new connection only. A queue that is already
        // unusable is dropped silently: nobody has been told about it yet.
        if let Some(frame) = self.presence_frame() {
            let pushed = self.members.get(&id).map(|c| c.try_push(frame));
            if let Some(Err(e)) = pushed {
                tracing::warn!("Dropping connection {} before announcement: {:?}", id, e);
                self.members.shift_remove(&id);
                return;
            }
        }

        // Additional tabs of an already-online user stay silent.
        if previous == 0 {
            if let Some(joined) = self.encode(&Message::user_joined(&user, self.clock.now())) {
                self.fan_out(&joined, &Target::All);
            }
            if let Some(frame) = self.presence_frame() {
                self.fan_out(&frame, &Target::All);
            }
        }
    }

    /// Remove a connection if still present, announcing the user's departure
    /// when it was their last connection. Returns whether anything was removed.
    fn remove(&mut self, id: ConnectionId) -> bool {
        let Some(connection) = self.members.shift_remove(&id) else {
            tracing::debug!("Connection {} already removed", id);
            return false;
        };
        // Dropping the entry closes the outbound queue.
        let user = OnlineUser::new(connection.user_id.clone(), connection.username.clone());
        drop(connection);

        let remaining = self.connections_for(&user.id);
        tracing::info!(
            "User left: {} ({}) connection={} user_connections={} total_connections={}",
            user.username,
            user.id,
            id,
            remaining,
            self.members.len()
        );

        if remaining == 0 {
            if let Some(left) = self.encode(&Message::user_left(&user, self.clock.now())) {
                self.fan_out(&left, &Target::All);
            }
            if let Some(frame) = self.presence_frame() {
                self.fan_out(&frame, &Target::All);
            }
        }

        true
    }

    /// Push a frame to every matching connection without waiting.
    ///
    /// Connections whose queue is full or closed are evicted after the pass.
    fn fan_out(&mut self, frame: &Frame, target: &Target) {
        let evicted: Vec<ConnectionId> = self
            .members
            .values()
            .filter(|connection| target.matches(connection))
            .filter_map(|connection| match connection.try_push(frame.clone()) {
                Ok(()) => None,
                Err(PushError::Full) => {
                    tracing::warn!(
                        "Outbound queue full for {} ({}), evicting connection {}",
                        connection.username,
                        connection.user_id,
                        connection.id
                    );
                    Some(connection.id)
                }
                Err(PushError::Closed) => {
                    tracing::debug!("Outbound queue closed for connection {}", connection.id);
                    Some(connection.id)
                }
            })
            .collect();

        for id in evicted {
            self.remove(id);
        }
    }

    fn online_users(&self) -> Vec<OnlineUser> {
        build_online_users(
            self.members
                .values()
                .map(|c| (&c.user_id, c.username.as_str())),
        )
    }

    fn connections_for(&self, user_id: &UserId) -> usize {
        count_connections_for(
            self.members
                .values()
                .map(|c| (&c.user_id, c.username.as_str())),
            user_id,
        )
    }

    fn presence_frame(&self) -> Option<Frame> {
        self.encode(&Message::online_users(
            &self.online_users(),
            self.clock.now(),
        ))
    }

    fn encode(&self, message: &Message) -> Option<Frame> {
        codec::encode(message)
            .inspect_err(|e| tracing::error!("Failed to encode {} message: {}", message.kind, e))
            .ok()
    }
}
