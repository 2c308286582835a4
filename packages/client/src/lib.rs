//! CLI client for the asobiba game hub.
//!
//! Connects to the server over WebSocket, turns slash commands typed at the
//! prompt into protocol commands, and renders server events for a terminal.

pub mod command;
pub mod error;
pub mod formatter;
pub mod session;
pub mod ui;
