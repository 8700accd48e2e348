//! Read side of a session: socket frames in, hub broadcasts out.

use std::{fmt::Display, sync::Arc, time::Duration};

use agora_shared::time::Clock;
use axum::extract::ws::Message as WsMessage;
use futures_util::{Stream, StreamExt};
use tokio::time;

use crate::{
    domain::{ConnectionId, Identity},
    hub::{Hub, HubError},
    infrastructure::codec,
};

use super::{
    PumpExit,
    dispatch::{self, Route},
};

/// Everything the read pump needs besides the socket
pub(crate) struct InboundContext {
    pub(crate) connection_id: ConnectionId,
    pub(crate) identity: Identity,
    pub(crate) hub: Hub,
    pub(crate) clock: Arc<dyn Clock>,
    /// Silence tolerated before the peer counts as gone; any inbound frame resets it
    pub(crate) pong_wait: Duration,
}

/// Read frames until the peer goes away, goes quiet, or the hub stops.
///
/// Malformed or non-relayable messages are logged and dropped; they never end
/// the session.
pub(crate) async fn read_pump<S, E>(mut stream: S, ctx: InboundContext) -> PumpExit
where
    S: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    loop {
        let frame = match time::timeout(ctx.pong_wait, stream.next()).await {
            Err(_) => return PumpExit::ReadTimeout,
            Ok(None) => return PumpExit::StreamEnded,
            Ok(Some(Err(e))) => return PumpExit::ReadError(e.to_string()),
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            WsMessage::Text(text) => {
                for part in codec::split_batch(text.as_str()) {
                    if let Err(HubError::Stopped) = relay(part, &ctx) {
                        return PumpExit::HubStopped;
                    }
                }
            }
            WsMessage::Close(_) => return PumpExit::PeerClosed,
            WsMessage::Ping(_) | WsMessage::Pong(_) => {}
            WsMessage::Binary(bytes) => {
                tracing::debug!(
                    "Connection {}: ignoring {} byte binary frame",
                    ctx.connection_id,
                    bytes.len()
                );
            }
        }
    }
}

fn relay(text: &str, ctx: &InboundContext) -> Result<(), HubError> {
    let now = ctx.clock.now();
    let message = match codec::decode(text, now) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(
                "Connection {} ({}): dropping inbound frame: {}",
                ctx.connection_id,
                ctx.identity.user_id,
                e
            );
            return Ok(());
        }
    };

    // Sender identity and time always come from the server.
    let message = message.stamped(&ctx.identity.user_id, &ctx.identity.username, now);

    match dispatch::route(&message) {
        Route::Broadcast => {
            tracing::debug!(
                "Relaying {} from {} ({})",
                message.kind,
                ctx.identity.username,
                ctx.identity.user_id
            );
            match ctx.hub.broadcast(message) {
                Err(HubError::Encode(e)) => {
                    tracing::error!("Failed to encode relayed message: {}", e);
                    Ok(())
                }
                other => other,
            }
        }
        Route::Ignore => {
            tracing::debug!(
                "Connection {}: ignoring {} message",
                ctx.connection_id,
                message.kind
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UserId,
        hub::{ConnectionHandle, OutboundQueue},
    };
    use agora_shared::time::FixedClock;
    use futures_util::stream;
    use serde_json::Value;

    fn identity(id: &str, name: &str) -> Identity {
        Identity {
            user_id: UserId::new(id).unwrap(),
            username: name.to_string(),
        }
    }

    fn context(hub: &Hub, who: Identity) -> InboundContext {
        InboundContext {
            connection_id: ConnectionId::generate(),
            identity: who,
            hub: hub.clone(),
            clock: Arc::new(FixedClock::from_millis(1_700_000_000_000)),
            pong_wait: Duration::from_secs(60),
        }
    }

    /// Register a listening connection and discard its join notifications.
    async fn observer(hub: &Hub) -> OutboundQueue {
        let (handle, mut queue) = ConnectionHandle::new(&identity("99", "observer"), 16);
        hub.register(handle).await.unwrap();
        while queue.try_pop().is_some() {}
        queue
    }

    fn text(body: &str) -> Result<WsMessage, axum::Error> {
        Ok(WsMessage::Text(body.to_string().into()))
    }

    fn parse(frame: &str) -> Value {
        serde_json::from_str(frame).unwrap()
    }

    #[tokio::test]
    async fn test_relayable_message_is_stamped_and_broadcast() {
        // テスト項目: 中継可能なメッセージはサーバー側の身元情報で上書きされてブロードキャストされる
        // given (前提条件):
        let hub = Hub::start(Arc::new(FixedClock::from_millis(0)));
        let mut queue = observer(&hub).await;
        let frames = stream::iter(vec![text(
            r#"{"type":"comment","data":{"post_id":"p1"},"user_id":"forged","username":"mallory"}"#,
        )]);

        // when (操作):
        let exit = read_pump(frames, context(&hub, identity("7", "alice"))).await;
        hub.snapshot().await.unwrap();

        // then (期待する結果):
        assert_eq!(exit, PumpExit::StreamEnded);
        let relayed = parse(&queue.try_pop().unwrap());
        assert_eq!(relayed["type"], "comment");
        assert_eq!(relayed["user_id"], "7");
        assert_eq!(relayed["username"], "alice");
        assert_eq!(relayed["data"]["post_id"], "p1");
        assert!(queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_malformed_and_server_owned_frames_are_dropped() {
        // テスト項目: 不正なフレームやサーバー専用の種別は破棄され、セッションは継続する
        // given (前提条件):
        let hub = Hub::start(Arc::new(FixedClock::from_millis(0)));
        let mut queue = observer(&hub).await;
        let frames = stream::iter(vec![
            text("not json"),
            text(r#"{"type":""}"#),
            text(r#"{"type":"online_users","data":[]}"#),
            text(r#"{"type":"bookmark"}"#),
            text(r#"{"type":"vote","data":{"post_id":"p2"}}"#),
        ]);

        // when (操作):
        let exit = read_pump(frames, context(&hub, identity("7", "alice"))).await;
        hub.snapshot().await.unwrap();

        // then (期待する結果):
        assert_eq!(exit, PumpExit::StreamEnded);
        assert_eq!(parse(&queue.try_pop().unwrap())["type"], "vote");
        assert!(queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_batched_text_frame_is_split() {
        // テスト項目: 改行区切りで連結されたフレームは個別のメッセージとして扱われる
        // given (前提条件):
        let hub = Hub::start(Arc::new(FixedClock::from_millis(0)));
        let mut queue = observer(&hub).await;
        let frames = stream::iter(vec![text(
            "{\"type\":\"typing\"}\n{\"type\":\"stop_typing\"}",
        )]);

        // when (操作):
        read_pump(frames, context(&hub, identity("7", "alice"))).await;
        hub.snapshot().await.unwrap();

        // then (期待する結果):
        assert_eq!(parse(&queue.try_pop().unwrap())["type"], "typing");
        assert_eq!(parse(&queue.try_pop().unwrap())["type"], "stop_typing");
    }

    #[tokio::test]
    async fn test_close_frame_ends_pump() {
        // テスト項目: Close フレームを受信すると後続を読まずに終了する
        // given (前提条件):
        let hub = Hub::start(Arc::new(FixedClock::from_millis(0)));
        let mut queue = observer(&hub).await;
        let frames = stream::iter(vec![
            Ok(WsMessage::Binary(vec![1, 2, 3].into())),
            Ok(WsMessage::Close(None)),
            text(r#"{"type":"vote"}"#),
        ]);

        // when (操作):
        let exit = read_pump(frames, context(&hub, identity("7", "alice"))).await;
        hub.snapshot().await.unwrap();

        // then (期待する結果):
        assert_eq!(exit, PumpExit::PeerClosed);
        assert!(queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_read_error_ends_pump() {
        // テスト項目: ソケットの読み取りエラーで終了する
        // given (前提条件):
        let hub = Hub::start(Arc::new(FixedClock::from_millis(0)));
        let frames = stream::iter(vec![Err::<WsMessage, _>("connection reset".to_string())]);

        // when (操作):
        let exit = read_pump(frames, context(&hub, identity("7", "alice"))).await;

        // then (期待する結果):
        assert_eq!(exit, PumpExit::ReadError("connection reset".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_times_out() {
        // テスト項目: pong_wait の間なにも受信しなければ終了する
        // given (前提条件):
        let hub = Hub::start(Arc::new(FixedClock::from_millis(0)));
        let frames = stream::pending::<Result<WsMessage, axum::Error>>();

        // when (操作):
        let exit = read_pump(frames, context(&hub, identity("7", "alice"))).await;

        // then (期待する結果):
        assert_eq!(exit, PumpExit::ReadTimeout);
    }

    #[tokio::test]
    async fn test_stopped_hub_ends_pump() {
        // テスト項目: ハブが停止している場合、中継しようとした時点で終了する
        // given (前提条件):
        let hub = Hub::start(Arc::new(FixedClock::from_millis(0)));
        hub.stop().await.unwrap();
        let frames = stream::iter(vec![text(r#"{"type":"reply"}"#)]);

        // when (操作):
        let exit = read_pump(frames, context(&hub, identity("7", "alice"))).await;

        // then (期待する結果):
        assert_eq!(exit, PumpExit::HubStopped);
    }
}
