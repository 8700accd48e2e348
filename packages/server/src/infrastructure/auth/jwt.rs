//! HS256 JWT implementation of [`TokenVerifier`].

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, Identity, TokenVerifier, UserId};

/// Claims carried by access tokens issued by the forum's auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Display name; the user id is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Verifies HS256-signed access tokens against a shared secret
pub struct JwtTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    fn verify_sync(&self, token: &str) -> Result<Identity, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;

        let claims = data.claims;
        let user_id =
            UserId::new(claims.user_id).map_err(|e| AuthError::Invalid(e.to_string()))?;
        let username = claims
            .username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user_id.as_str().to_string());

        Ok(Identity { user_id, username })
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_sync(token)
    }
}
