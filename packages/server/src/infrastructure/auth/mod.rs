//! Credential verification adapters.

pub mod jwt;

pub use jwt::JwtTokenVerifier;
