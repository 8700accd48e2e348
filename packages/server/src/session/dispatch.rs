//! Routing of stamped inbound messages.

use crate::domain::Message;

/// What a session does with a decoded inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    /// Relay to every connection through the hub
    Broadcast,
    /// Log and drop
    Ignore,
}

pub(crate) fn route(message: &Message) -> Route {
    if message.kind.is_client_relayable() {
        Route::Broadcast
    } else {
        Route::Ignore
    }
}
