//! Terminal client for the agora live-update channel.
//!
//! Shows who is online and every vote, comment, reply and typing indicator as
//! it happens. Lines typed as `<type> [json]` are sent as interaction events.
//! Reconnects with exponential backoff; a rejected token ends the client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-client -- --token <jwt>
//! cargo run --bin agora-client -- -u ws://127.0.0.1:3000/ws -t <jwt>
//! ```

use agora_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agora-client")]
#[command(about = "Terminal client for the agora live-update channel", long_about = None)]
struct Args {
    /// Access token (HS256 JWT) issued by the forum
    #[arg(short = 't', long, env = "AGORA_TOKEN", hide_env_values = true)]
    token: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = agora_client::run_client(args.url, args.token).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
