//! Conversion logic between DTOs and domain entities.

use crate::domain::{Message, MessageType, OnlineUser, UserId};

use super::websocket::{OnlineUserDto, WireMessage};

// ========================================
// Domain → DTO
// ========================================

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            r#type: message.kind.as_str().to_string(),
            data: message.data.clone(),
            user_id: message.user_id.as_ref().map(|id| id.as_str().to_string()),
            username: message.username.clone(),
            timestamp: Some(message.timestamp),
        }
    }
}

impl From<&OnlineUser> for OnlineUserDto {
    fn from(user: &OnlineUser) -> Self {
        Self {
            id: user.id.as_str().to_string(),
            username: user.username.clone(),
        }
    }
}

// ========================================
// DTO → Domain
// ========================================

impl WireMessage {
    /// Convert into a domain message.
    ///
    /// Returns `None` when the type tag is blank. An invalid `user_id` claim is
    /// dropped rather than rejected; a missing timestamp becomes `fallback`.
    pub fn into_domain(self, fallback: chrono::DateTime<chrono::Utc>) -> Option<Message> {
        let tag = self.r#type.trim();
        if tag.is_empty() {
            return None;
        }
        Some(Message {
            kind: MessageType::from(tag),
            data: self.data,
            user_id: self.user_id.and_then(|raw| UserId::new(raw).ok()),
            username: self.username,
            timestamp: self.timestamp.unwrap_or(fallback),
        })
    }
}
