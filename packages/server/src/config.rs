//! Runtime configuration.
//!
//! Binaries build these from command-line flags and environment variables;
//! tests use the defaults or tweak individual fields.

use std::time::Duration;

/// Commands buffered in front of the hub control loop
pub const DEFAULT_HUB_COMMAND_CAPACITY: usize = 4096;
/// Frames buffered per connection before the consumer counts as too slow
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
/// Deadline for a single network write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Silence tolerated on a connection before it is considered dead
pub const DEFAULT_PONG_WAIT: Duration = Duration::from_secs(60);
/// Largest inbound message accepted, in bytes
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512;

/// Per-connection session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub queue_capacity: usize,
    pub write_timeout: Duration,
    pub pong_wait: Duration,
    /// Idle interval between liveness pings; must be shorter than `pong_wait`
    pub ping_period: Duration,
    pub max_message_size: usize,
}

impl SessionConfig {
    /// Ping period derived from the pong wait (nine tenths of it).
    pub fn ping_period_for(pong_wait: Duration) -> Duration {
        pong_wait * 9 / 10
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            pong_wait: DEFAULT_PONG_WAIT,
            ping_period: Self::ping_period_for(DEFAULT_PONG_WAIT),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
    pub session: SessionConfig,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
