//! Credential-verification boundary.
//!
//! Token issuance and password handling live elsewhere; the live-update
//! channel only needs to turn a presented token into a logical user.

use async_trait::async_trait;

use super::{error::AuthError, value_object::UserId};

/// Authenticated identity yielded by a [`TokenVerifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    /// Display name used in presence and on relayed messages
    pub username: String,
}

/// Verifies an identity token presented at connection upgrade.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}
