//! HTTP / WebSocket endpoint handlers.

pub mod http;
pub mod websocket;

pub use http::{debug_hub_state, get_rooms, get_scoreboard, health_check};
pub use websocket::websocket_handler;
