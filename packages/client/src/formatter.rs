//! Message formatting utilities for client display.

use agora_server::infrastructure::dto::websocket::{OnlineUserDto, WireMessage};
use agora_shared::time::to_clock_label;
use serde_json::Value;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format one received message according to its type
    pub fn format(message: &WireMessage) -> String {
        let who = Self::sender(message);
        match message.r#type.as_str() {
            "online_users" => Self::format_online_users(&message.data),
            "user_joined" => format!("\n+ {} is online{}\n", who, Self::at(message)),
            "user_left" => format!("\n- {} went offline{}\n", who, Self::at(message)),
            "typing" => format!("\n… {} is typing\n", who),
            "stop_typing" => format!("\n  {} stopped typing\n", who),
            "vote" => format!(
                "\n▲ {} voted {}{}\n",
                who,
                Self::summary(&message.data),
                Self::at(message)
            ),
            "comment" => Self::format_post(who, "commented", message),
            "reply" => Self::format_post(who, "replied", message),
            other => format!("\n← {}: {}\n", other, Self::summary(&message.data)),
        }
    }

    /// Format the presence list
    pub fn format_online_users(data: &Value) -> String {
        let users: Vec<OnlineUserDto> = serde_json::from_value(data.clone()).unwrap_or_default();
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str(&format!("Online ({}):\n", users.len()));
        if users.is_empty() {
            output.push_str("(nobody)\n");
        } else {
            for user in &users {
                output.push_str(&format!("{} [{}]\n", user.username, user.id));
            }
        }
        output.push_str("============================================================\n");
        output
    }

    /// Format a raw text frame (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    fn format_post(who: &str, verb: &str, message: &WireMessage) -> String {
        let body = ["body", "content", "text"]
            .iter()
            .find_map(|key| message.data.get(*key).and_then(Value::as_str));
        let text = match body {
            Some(body) => body.to_string(),
            None => Self::summary(&message.data),
        };
        format!(
            "\n\n------------------------------------------------------------\n\
             @{} {}{}:\n\
             {}\n\
             ------------------------------------------------------------\n",
            who,
            verb,
            Self::at(message),
            text
        )
    }

    /// Display name of the user a message is about, falling back to the user id
    fn sender(message: &WireMessage) -> &str {
        message
            .username
            .as_deref()
            .or(message.user_id.as_deref())
            .unwrap_or("someone")
    }

    fn at(message: &WireMessage) -> String {
        message
            .timestamp
            .map(|ts| format!(" at {}", to_clock_label(&ts)))
            .unwrap_or_default()
    }

    fn summary(data: &Value) -> String {
        match data {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
