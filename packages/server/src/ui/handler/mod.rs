mod http;
mod websocket;

pub use http::{health_check, online_count, online_users};
pub use websocket::websocket_handler;
