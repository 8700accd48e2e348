//! Domain layer: value objects, the message model, presence derivation and
//! the credential-verification boundary.

pub mod auth;
pub mod error;
pub mod message;
pub mod presence;
pub mod value_object;

pub use auth::{Identity, TokenVerifier};
#[cfg(test)]
pub use auth::MockTokenVerifier;
pub use error::{AuthError, ValueObjectError};
pub use message::{Message, MessageType};
pub use presence::OnlineUser;
pub use value_object::{ConnectionId, UserId};
