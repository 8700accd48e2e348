//! Connection registry and fan-out hub.
//!
//! The hub is an actor: a single control loop owns the membership set and
//! consumes commands from one FIFO channel. Everything else talks to it
//! through the cloneable [`Hub`] handle.

mod actor;
mod command;
mod connection;
mod error;
mod handle;

pub use connection::{ConnectionHandle, OutboundQueue, PushError};
pub use error::HubError;
pub use handle::{Hub, PresenceSnapshot};
