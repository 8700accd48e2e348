//! Terminal client for the agora live-update channel.
//!
//! Prints presence changes and interaction events as they arrive and sends
//! typed input lines as interaction events.

pub mod error;
mod formatter;
mod input;
mod runner;
mod session;
mod ui;

pub use runner::{Backoff, run_client};
