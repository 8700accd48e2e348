//! Data Transfer Objects (DTOs) for the live-update channel.
//!
//! DTOs are organized by protocol:
//! - `websocket`: frames exchanged over the socket
//! - `http`: HTTP API response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
