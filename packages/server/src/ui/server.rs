//! Server execution logic.

use std::{future::Future, sync::Arc};

use agora_shared::time::Clock;
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::{ServerConfig, SessionConfig},
    domain::TokenVerifier,
    hub::Hub,
};

use super::{
    handler::{health_check, online_count, online_users, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Live-update server
///
/// # Example
///
/// ```ignore
/// let hub = Hub::start(Arc::new(SystemClock));
/// let server = Server::new(hub, verifier, Arc::new(SystemClock), config.session.clone());
/// server.run(&config).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(
        hub: Hub,
        verifier: Arc<dyn TokenVerifier>,
        clock: Arc<dyn Clock>,
        session: SessionConfig,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                hub,
                verifier,
                clock,
                session,
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/online-users", get(online_users))
            .route("/api/online-count", get(online_count))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Live-update server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?token=<jwt>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// When `shutdown` fires the hub is stopped first, which closes every
    /// session, and then the HTTP server drains.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let hub = self.state.hub.clone();
        let shutdown = async move {
            shutdown.await;
            if let Err(e) = hub.stop().await {
                tracing::warn!("Hub was already stopped: {}", e);
            }
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
