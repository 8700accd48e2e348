//! Value objects for the live-update channel.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a logical user identifier
pub const USER_ID_MAX_LEN: usize = 128;

/// Authenticated logical user identifier.
///
/// One logical user may hold several concurrent connections (browser tabs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId, trimming surrounding whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::UserIdEmpty);
        }
        let len = trimmed.chars().count();
        if len > USER_ID_MAX_LEN {
            return Err(ValueObjectError::UserIdTooLong {
                max: USER_ID_MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-unique identifier of one physical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Mint a fresh connection identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_trims_whitespace() {
        // テスト項目: 前後の空白が取り除かれた UserId が生成される
        // given (前提条件):
        let raw = "  user-42 ";

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "user-42");
    }

    #[test]
    fn test_user_id_rejects_blank() {
        // テスト項目: 空白のみの UserId はエラーになる
        // given (前提条件):
        let raw = "   ";

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::UserIdEmpty));
    }

    #[test]
    fn test_user_id_rejects_too_long() {
        // テスト項目: 最大長を超える UserId はエラーになる
        // given (前提条件):
        let raw = "a".repeat(USER_ID_MAX_LEN + 1);

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::UserIdTooLong {
                max: USER_ID_MAX_LEN,
                actual: USER_ID_MAX_LEN + 1,
            })
        );
    }

    #[test]
    fn test_user_id_deserialize_validates() {
        // テスト項目: JSON からのデシリアライズでもバリデーションが行われる
        // given (前提条件):
        let valid = "\"alice\"";
        let invalid = "\"\"";

        // when (操作):
        let ok: Result<UserId, _> = serde_json::from_str(valid);
        let err: Result<UserId, _> = serde_json::from_str(invalid);

        // then (期待する結果):
        assert_eq!(ok.unwrap().as_str(), "alice");
        assert!(err.is_err());
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: ConnectionId は生成ごとに異なる値になる
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }
}
