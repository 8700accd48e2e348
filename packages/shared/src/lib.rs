//! Utilities shared by the agora server and client binaries.

pub mod logger;
pub mod time;
