//! Connection lifecycle.

use std::fmt;

use crate::domain::ConnectionId;

/// `Connecting → Open → Closing → Closed`
///
/// `Open` is only entered after the hub accepted the registration. A session
/// that fails to register goes straight to `Closing`; no state skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Open) | (Connecting, Closing) | (Open, Closing) | (Closing, Closing) | (Closing, Closed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        };
        f.write_str(label)
    }
}

/// Tracks one connection's state, refusing invalid transitions.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    connection_id: ConnectionId,
    state: SessionState,
}

impl Lifecycle {
    pub(crate) fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            state: SessionState::Connecting,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`. Returns `false` (and keeps the current state) when the
    /// transition is not allowed.
    pub(crate) fn advance(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                "Connection {}: ignoring invalid transition {} -> {}",
                self.connection_id,
                self.state,
                next
            );
            return false;
        }
        if self.state != next {
            tracing::debug!("Connection {}: {} -> {}", self.connection_id, self.state, next);
        }
        self.state = next;
        true
    }
}
