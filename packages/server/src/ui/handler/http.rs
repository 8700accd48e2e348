//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    hub::HubError,
    infrastructure::dto::{
        http::{OnlineCountResponse, OnlineUsersResponse},
        websocket::OnlineUserDto,
    },
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Deduplicated list of online users
pub async fn online_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OnlineUsersResponse>, StatusCode> {
    let users = state.hub.online_users().await.map_err(unavailable)?;

    // Domain Model から DTO への変換
    let users: Vec<OnlineUserDto> = users.iter().map(OnlineUserDto::from).collect();
    Ok(Json(OnlineUsersResponse {
        count: users.len(),
        users,
    }))
}

/// Distinct online users and raw connection count
pub async fn online_count(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OnlineCountResponse>, StatusCode> {
    let snapshot = state.hub.snapshot().await.map_err(unavailable)?;
    Ok(Json(OnlineCountResponse {
        count: snapshot.users.len(),
        connections: snapshot.connections,
    }))
}

fn unavailable(e: HubError) -> StatusCode {
    tracing::warn!("Presence query failed: {}", e);
    StatusCode::SERVICE_UNAVAILABLE
}
