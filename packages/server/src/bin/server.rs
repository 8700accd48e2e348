//! Live-update server for the agora forum.
//!
//! Authenticated clients connect over WebSocket, see who else is online and
//! receive every vote, comment, reply and typing indicator as it happens.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET_KEY=secret cargo run --bin agora-server
//! JWT_SECRET_KEY=secret cargo run --bin agora-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use agora_server::{
    config::{
        DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PONG_WAIT, DEFAULT_QUEUE_CAPACITY,
        DEFAULT_WRITE_TIMEOUT, ServerConfig, SessionConfig,
    },
    hub::Hub,
    infrastructure::auth::JwtTokenVerifier,
    ui::Server,
};
use agora_shared::{logger::setup_logger, time::SystemClock};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agora-server")]
#[command(about = "Presence-aware WebSocket live-update server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "AGORA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// HS256 secret used to verify access tokens
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    jwt_secret: String,

    /// Frames buffered per connection before it is evicted as too slow
    #[arg(long, env = "AGORA_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Seconds allowed for a single write
    #[arg(long, env = "AGORA_WRITE_TIMEOUT", default_value_t = DEFAULT_WRITE_TIMEOUT.as_secs())]
    write_timeout: u64,

    /// Seconds of silence before a connection is considered dead
    #[arg(long, env = "AGORA_PONG_WAIT", default_value_t = DEFAULT_PONG_WAIT.as_secs())]
    pong_wait: u64,

    /// Largest inbound message accepted, in bytes
    #[arg(long, env = "AGORA_MAX_MESSAGE_SIZE", default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        let pong_wait = Duration::from_secs(args.pong_wait.max(1));
        Self {
            host: args.host,
            port: args.port,
            jwt_secret: args.jwt_secret,
            session: SessionConfig {
                queue_capacity: args.queue_capacity,
                write_timeout: Duration::from_secs(args.write_timeout.max(1)),
                pong_wait,
                ping_period: SessionConfig::ping_period_for(pong_wait),
                max_message_size: args.max_message_size,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::from(Args::parse());

    // 1. Hub (connection registry and fan-out)
    let clock = Arc::new(SystemClock);
    let hub = Hub::start(clock.clone());

    // 2. Token verification
    let verifier = Arc::new(JwtTokenVerifier::new(config.jwt_secret.as_bytes()));

    // 3. Server
    let server = Server::new(hub, verifier, clock, config.session.clone());
    if let Err(e) = server.run(&config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
