//! WebSocket upgrade entrypoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    domain::{AuthError, Identity, TokenVerifier},
    infrastructure::dto::http::ErrorResponse,
    session::ClientSession,
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Authenticate the caller, then upgrade and hand the socket to a session.
///
/// Credentials are checked before the upgrade so a rejected caller gets a
/// plain 401 with a JSON body.
pub async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let identity = match authenticate(state.verifier.as_ref(), query.token.as_deref()).await {
        Ok(identity) => identity,
        Err(rejection) => return rejection.into_response(),
    };

    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!("Rejected upgrade for {}: {}", identity.user_id, rejection);
            return rejection.into_response();
        }
    };

    tracing::info!(
        "Upgrading connection for {} ({})",
        identity.username,
        identity.user_id
    );
    let session = ClientSession::new(
        identity,
        state.hub.clone(),
        state.clock.clone(),
        state.session.clone(),
    );
    ws.max_message_size(state.session.max_message_size)
        .on_upgrade(move |socket| session.run(socket))
}

/// 401 response produced when the caller cannot be identified
#[derive(Debug, PartialEq, Eq)]
pub struct Unauthorized(&'static str);

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

async fn authenticate(
    verifier: &dyn TokenVerifier,
    token: Option<&str>,
) -> Result<Identity, Unauthorized> {
    let token = token.map(str::trim).filter(|t| !t.is_empty());
    let Some(token) = token else {
        tracing::warn!("Connection attempt without a token");
        return Err(Unauthorized("Token required"));
    };

    match verifier.verify(token).await {
        Ok(identity) => Ok(identity),
        Err(AuthError::MissingToken) => {
            tracing::warn!("Connection attempt without a token");
            Err(Unauthorized("Token required"))
        }
        Err(e) => {
            tracing::warn!("Token rejected: {}", e);
            Err(Unauthorized("Invalid token"))
        }
    }
}
