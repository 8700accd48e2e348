//! Commands consumed by the hub control loop.

use tokio::sync::oneshot;

use crate::{
    domain::{ConnectionId, UserId},
    infrastructure::codec::Frame,
};

use super::{connection::ConnectionHandle, handle::PresenceSnapshot};

pub(super) enum HubCommand {
    Register {
        connection: ConnectionHandle,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        id: ConnectionId,
        /// `true` when this call removed the connection
        ack: oneshot::Sender<bool>,
    },
    Broadcast {
        frame: Frame,
    },
    BroadcastToUser {
        user_id: UserId,
        frame: Frame,
    },
    Snapshot {
        reply: oneshot::Sender<PresenceSnapshot>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}
