//! End-to-end tests: an in-process server driven over real sockets.

use std::{collections::VecDeque, net::SocketAddr, sync::Arc, time::Duration};

use agora_server::{
    config::SessionConfig,
    hub::Hub,
    infrastructure::auth::{JwtTokenVerifier, jwt::Claims},
    ui::Server,
};
use agora_shared::time::SystemClock;
use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, task::JoinHandle, time};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};

const SECRET: &[u8] = b"integration-secret";
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let clock = Arc::new(SystemClock);
        let server = Server::new(
            Hub::start(clock.clone()),
            Arc::new(JwtTokenVerifier::new(SECRET)),
            clock,
            SessionConfig::default(),
        );
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let stopped = async {
                let _ = signal.await;
            };
            if let Err(e) = server.serve(listener, stopped).await {
                panic!("server failed: {e}");
            }
        });

        TestServer {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    fn ws_url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/ws?token={}", self.addr, token),
            None => format!("ws://{}/ws", self.addr),
        }
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            time::timeout(RECV_TIMEOUT, task).await.unwrap().unwrap();
        }
    }
}

fn token(user_id: &str, username: &str) -> String {
    let claims = Claims {
        user_id: user_id.to_string(),
        username: Some(username.to_string()),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

/// Helper struct for one WebSocket client
struct TestClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pending: VecDeque<Value>,
}

impl TestClient {
    async fn connect(server: &TestServer, user_id: &str, username: &str) -> Self {
        let url = server.ws_url(Some(&token(user_id, username)));
        let (socket, _) = connect_async(url).await.unwrap();
        let mut client = TestClient {
            socket,
            pending: VecDeque::new(),
        };
        // The private presence snapshot marks the end of registration.
        client.expect("online_users").await;
        client
    }

    async fn send(&mut self, message: Value) {
        self.socket
            .send(Message::Text(message.to_string().into()))
            .await
            .unwrap();
    }

    /// Next decoded message, splitting batched frames.
    async fn next(&mut self) -> Value {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return message;
            }
            let frame = time::timeout(RECV_TIMEOUT, self.socket.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .unwrap();
            if let Message::Text(text) = frame {
                for part in text.as_str().split('\n').filter(|p| !p.trim().is_empty()) {
                    self.pending.push_back(serde_json::from_str(part).unwrap());
                }
            }
        }
    }

    async fn expect(&mut self, kind: &str) -> Value {
        let message = self.next().await;
        assert_eq!(message["type"], kind, "unexpected message: {message}");
        message
    }

    async fn close(mut self) {
        self.socket.close(None).await.unwrap();
    }
}

fn usernames(presence: &Value) -> Vec<String> {
    presence["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_first_connection_sees_itself_online() {
    // テスト項目: 最初の接続は自分を含むオンライン一覧と user_joined を受け取る
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let mut alice = TestClient::connect(&server, "1", "alice").await;

    // then (期待する結果):
    let joined = alice.expect("user_joined").await;
    assert_eq!(joined["user_id"], "1");
    assert_eq!(joined["username"], "alice");
    let presence = alice.expect("online_users").await;
    assert_eq!(usernames(&presence), vec!["alice"]);

    alice.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_interaction_is_relayed_with_server_identity() {
    // テスト項目: クライアントの送ったコメントはサーバー側の身元情報で全員に配信される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server, "1", "alice").await;
    alice.expect("user_joined").await;
    alice.expect("online_users").await;
    let mut bob = TestClient::connect(&server, "2", "bob").await;
    bob.expect("user_joined").await;
    bob.expect("online_users").await;
    alice.expect("user_joined").await;
    alice.expect("online_users").await;

    // when (操作):
    bob.send(json!({
        "type": "comment",
        "data": {"post_id": "p1", "body": "hello"},
        "user_id": "1",
        "username": "alice"
    }))
    .await;

    // then (期待する結果):
    for client in [&mut alice, &mut bob] {
        let comment = client.expect("comment").await;
        assert_eq!(comment["user_id"], "2");
        assert_eq!(comment["username"], "bob");
        assert_eq!(comment["data"]["body"], "hello");
        assert!(comment["timestamp"].is_string());
    }

    alice.close().await;
    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_second_tab_is_silent_and_last_tab_announces_departure() {
    // テスト項目: 同一ユーザーの 2 つ目の接続は通知されず、最後の接続が切れたときだけ user_left が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut bob = TestClient::connect(&server, "2", "bob").await;
    bob.expect("user_joined").await;
    bob.expect("online_users").await;
    let alice_tab1 = TestClient::connect(&server, "1", "alice").await;
    bob.expect("user_joined").await;
    bob.expect("online_users").await;

    // when (操作):
    let alice_tab2 = TestClient::connect(&server, "1", "alice").await;
    bob.send(json!({"type": "typing"})).await;

    // then (期待する結果):
    bob.expect("typing").await;

    // when (操作):
    alice_tab1.close().await;
    bob.send(json!({"type": "stop_typing"})).await;

    // then (期待する結果):
    bob.expect("stop_typing").await;

    // when (操作):
    alice_tab2.close().await;

    // then (期待する結果):
    let left = bob.expect("user_left").await;
    assert_eq!(left["user_id"], "1");
    assert_eq!(left["username"], "alice");
    let presence = bob.expect("online_users").await;
    assert_eq!(usernames(&presence), vec!["bob"]);

    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_upgrade_without_valid_token_is_unauthorized() {
    // テスト項目: トークンなし / 不正なトークンでは 401 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let missing = connect_async(server.ws_url(None)).await;
    let forged = connect_async(server.ws_url(Some("not-a-jwt"))).await;

    // then (期待する結果):
    for (result, expected) in [(missing, "Token required"), (forged, "Invalid token")] {
        match result {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status().as_u16(), 401);
                let body: Value = serde_json::from_slice(response.body().as_deref().unwrap()).unwrap();
                assert_eq!(body["error"], expected);
            }
            Err(e) => panic!("expected 401, got {e}"),
            Ok(_) => panic!("expected 401, connection was upgraded"),
        }
    }

    server.stop().await;
}

#[tokio::test]
async fn test_http_presence_endpoints() {
    // テスト項目: HTTP API でオンライン一覧と人数・接続数が取得できる
    // given (前提条件):
    let server = TestServer::start().await;
    let alice_tab1 = TestClient::connect(&server, "1", "alice").await;
    let alice_tab2 = TestClient::connect(&server, "1", "alice").await;
    let bob = TestClient::connect(&server, "2", "bob").await;
    let http = reqwest::Client::new();

    // when (操作):
    let health: Value = http
        .get(server.http_url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let users: Value = http
        .get(server.http_url("/api/online-users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let count: Value = http
        .get(server.http_url("/api/online-count"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health, json!({"status": "ok"}));
    assert_eq!(
        users,
        json!({
            "users": [{"id": "1", "username": "alice"}, {"id": "2", "username": "bob"}],
            "count": 2
        })
    );
    assert_eq!(count, json!({"count": 2, "connections": 3}));

    alice_tab1.close().await;
    alice_tab2.close().await;
    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_sessions() {
    // テスト項目: サーバー停止時に接続中のクライアントへ Close が送られる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server, "1", "alice").await;
    alice.expect("user_joined").await;
    alice.expect("online_users").await;

    // when (操作):
    server.stop().await;

    // then (期待する結果):
    let frame = time::timeout(RECV_TIMEOUT, alice.socket.next()).await.unwrap();
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
}
