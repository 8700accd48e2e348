//! Infrastructure layer: wire DTOs and codec, credential verification adapters.

pub mod auth;
pub mod codec;
pub mod dto;
