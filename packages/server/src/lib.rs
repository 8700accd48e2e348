//! Real-time fan-out server for the agora forum.
//!
//! Authenticated WebSocket clients are registered with a single hub that
//! tracks who is online and relays interaction events (votes, comments,
//! replies, typing indicators) to every connected client.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;

// live-update core
pub mod hub;
pub mod session;

pub mod config;
