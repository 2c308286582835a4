//! Shared utilities for the asobiba game hub.
//!
//! Logging setup and time handling used by both the server and the CLI
//! client.

pub mod logger;
pub mod time;
