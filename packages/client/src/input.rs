//! Parsing of typed input lines.

use agora_server::{domain::MessageType, infrastructure::dto::websocket::WireMessage};
use serde_json::Value;

use crate::error::InputError;

/// Parse `<type> [json]` into an outbound message.
///
/// ```text
/// typing
/// vote {"post_id":"p1","score":1}
/// comment {"post_id":"p1","body":"nice"}
/// ```
///
/// Identity and timestamp are left empty; the server stamps them.
pub fn parse_input(line: &str) -> Result<WireMessage, InputError> {
    let line = line.trim();
    let (tag, payload) = match line.split_once(char::is_whitespace) {
        Some((tag, payload)) => (tag, payload.trim()),
        None => (line, ""),
    };
    if tag.is_empty() {
        return Err(InputError::Empty);
    }

    let kind = MessageType::from(tag);
    if !kind.is_client_relayable() {
        return Err(InputError::UnsupportedType(tag.to_string()));
    }

    let data = if payload.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(payload).map_err(|e| InputError::InvalidJson(e.to_string()))?
    };

    Ok(WireMessage {
        r#type: kind.as_str().to_string(),
        data,
        user_id: None,
        username: None,
        timestamp: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_type() {
        // テスト項目: 種別だけの入力はペイロードなしのメッセージになる
        // given (前提条件):
        let line = "typing";

        // when (操作):
        let message = parse_input(line).unwrap();

        // then (期待する結果):
        assert_eq!(message.r#type, "typing");
        assert_eq!(message.data, Value::Null);
        assert!(message.user_id.is_none());
    }

    #[test]
    fn test_parse_type_with_json_payload() {
        // テスト項目: 種別に続く JSON がペイロードになる
        // given (前提条件):
        let line = r#"  vote {"post_id": "p1", "score": 1}  "#;

        // when (操作):
        let message = parse_input(line).unwrap();

        // then (期待する結果):
        assert_eq!(message.r#type, "vote");
        assert_eq!(message.data, json!({"post_id": "p1", "score": 1}));
    }

    #[test]
    fn test_reject_empty_input() {
        // テスト項目: 空白だけの入力は送信しない
        // given (前提条件):
        let line = "   ";

        // when (操作):
        let result = parse_input(line);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), InputError::Empty);
    }

    #[test]
    fn test_reject_server_owned_type() {
        // テスト項目: サーバーが発行する種別は送信できない
        // given (前提条件):
        let line = "user_joined {}";

        // when (操作):
        let result = parse_input(line);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            InputError::UnsupportedType("user_joined".to_string())
        );
    }

    #[test]
    fn test_reject_invalid_json() {
        // テスト項目: ペイロードが JSON でない場合はエラーになる
        // given (前提条件):
        let line = "comment hello there";

        // when (操作):
        let result = parse_input(line);

        // then (期待する結果):
        assert!(matches!(result, Err(InputError::InvalidJson(_))));
    }
}
