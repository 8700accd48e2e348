//! WebSocket client session management.

use agora_server::infrastructure::{codec::split_batch, dto::websocket::WireMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use crate::{error::ClientError, input::parse_input, ui::redisplay_prompt};

use super::formatter::MessageFormatter;

/// How a session that was successfully established came to an end
#[derive(Debug)]
pub enum SessionEnd {
    /// Input was closed (Ctrl+D / Ctrl+C)
    UserExit,
    /// The connection dropped after it was established
    Lost(String),
}

/// Run one WebSocket session until the user exits or the connection drops.
///
/// `Err` is returned only when the connection could not be established.
pub async fn run_client_session(
    url: &str,
    token: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let url = format!("{}?token={}", url, token);

    let (ws_stream, _) = match connect_async(&url).await {
        Ok(result) => result,
        Err(WsError::Http(response)) if response.status().as_u16() == 401 => {
            let reason = response
                .body()
                .as_deref()
                .and_then(|body| serde_json::from_slice::<serde_json::Value>(body).ok())
                .and_then(|body| body["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| "token rejected".to_string());
            return Err(ClientError::Unauthorized(reason));
        }
        Err(e) => return Err(ClientError::ConnectionError(e.to_string())),
    };

    tracing::info!("Connected to live-update server!");
    println!(
        "\nType `<type> [json]` and press Enter to send, e.g. `vote {{\"post_id\":\"1\"}}`. Press Ctrl+D to exit.\n"
    );

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming messages
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    for part in split_batch(text.as_str()) {
                        let formatted = match serde_json::from_str::<WireMessage>(part) {
                            Ok(message) => MessageFormatter::format(&message),
                            Err(_) => MessageFormatter::format_raw_message(part),
                        };
                        print!("{}", formatted);
                    }
                    redisplay_prompt();
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt();
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return "closed by server".to_string();
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return e.to_string();
                }
                _ => {}
            }
        }
        "stream ended".to_string()
    });

    loop {
        tokio::select! {
            result = &mut read_task => {
                let reason = result.unwrap_or_else(|e| e.to_string());
                return Ok(SessionEnd::Lost(reason));
            }
            line = input.recv() => {
                let Some(line) = line else {
                    read_task.abort();
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::UserExit);
                };

                let message = match parse_input(&line) {
                    Ok(message) => message,
                    Err(e) => {
                        println!("! {}", e);
                        redisplay_prompt();
                        continue;
                    }
                };
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::warn!("Failed to send message: {}", e);
                    read_task.abort();
                    return Ok(SessionEnd::Lost(e.to_string()));
                }
            }
        }
    }
}
