//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::OnlineUserDto;

/// Response body of `GET /api/online-users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    pub users: Vec<OnlineUserDto>,
    pub count: usize,
}

/// Response body of `GET /api/online-count`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineCountResponse {
    /// Distinct logical users online
    pub count: usize,
    /// Live physical connections
    pub connections: usize,
}

/// Error body returned by the upgrade entrypoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
