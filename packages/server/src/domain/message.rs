//! Message model carried over the live-update channel.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{presence::OnlineUser, value_object::UserId};

/// Type tag of a live-update message.
///
/// Tags outside the fixed set are kept verbatim as [`MessageType::Custom`] so
/// domain producers can introduce new payload types without touching the hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Vote,
    Comment,
    Reply,
    Online,
    Offline,
    Typing,
    StopTyping,
    OnlineUsers,
    UserJoined,
    UserLeft,
    Custom(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Vote => "vote",
            Self::Comment => "comment",
            Self::Reply => "reply",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Typing => "typing",
            Self::StopTyping => "stop_typing",
            Self::OnlineUsers => "online_users",
            Self::UserJoined => "user_joined",
            Self::UserLeft => "user_left",
            Self::Custom(tag) => tag,
        }
    }

    /// Whether a client session relays this type to every connection.
    pub fn is_client_relayable(&self) -> bool {
        matches!(
            self,
            Self::Typing | Self::StopTyping | Self::Vote | Self::Comment | Self::Reply
        )
    }
}

impl From<&str> for MessageType {
    fn from(tag: &str) -> Self {
        match tag {
            "vote" => Self::Vote,
            "comment" => Self::Comment,
            "reply" => Self::Reply,
            "online" => Self::Online,
            "offline" => Self::Offline,
            "typing" => Self::Typing,
            "stop_typing" => Self::StopTyping,
            "online_users" => Self::OnlineUsers,
            "user_joined" => Self::UserJoined,
            "user_left" => Self::UserLeft,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable live-update message
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageType,
    /// Open-ended payload, `Value::Null` when the type carries none
    pub data: Value,
    /// Originating logical user, if any
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(kind: MessageType, data: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            data,
            user_id: None,
            username: None,
            timestamp,
        }
    }

    /// Attach the originating user.
    pub fn with_sender(mut self, user_id: UserId, username: impl Into<String>) -> Self {
        self.user_id = Some(user_id);
        self.username = Some(username.into());
        self
    }

    /// Overwrite every identity claim and the timestamp with the session's own.
    ///
    /// A connection can never speak for another user.
    pub fn stamped(self, user_id: &UserId, username: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id: Some(user_id.clone()),
            username: Some(username.to_string()),
            timestamp,
            ..self
        }
    }

    pub fn user_joined(user: &OnlineUser, timestamp: DateTime<Utc>) -> Self {
        Self::new(MessageType::UserJoined, Value::Null, timestamp)
            .with_sender(user.id.clone(), user.username.clone())
    }

    pub fn user_left(user: &OnlineUser, timestamp: DateTime<Utc>) -> Self {
        Self::new(MessageType::UserLeft, Value::Null, timestamp)
            .with_sender(user.id.clone(), user.username.clone())
    }

    /// Presence snapshot message carrying `[{id, username}, ...]`
    pub fn online_users(users: &[OnlineUser], timestamp: DateTime<Utc>) -> Self {
        let data = Value::Array(users.iter().map(OnlineUser::to_json).collect());
        Self::new(MessageType::OnlineUsers, data, timestamp)
    }
}
