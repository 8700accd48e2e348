//! Shared application state.

use std::sync::Arc;

use agora_shared::time::Clock;

use crate::{config::SessionConfig, domain::TokenVerifier, hub::Hub};

/// State handed to every request handler
pub struct AppState {
    /// Connection registry and fan-out engine
    pub hub: Hub,
    /// Credential check performed before the upgrade
    pub verifier: Arc<dyn TokenVerifier>,
    pub clock: Arc<dyn Clock>,
    /// Settings applied to each new session
    pub session: SessionConfig,
}
