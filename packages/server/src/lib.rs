//! Real-time multiplayer mini-games hub.
//!
//! Authenticated users create or join rooms to play one of three turn-based
//! games (tic-tac-toe, rock-paper-scissors, memory-match), with spectating,
//! lobby/room chat, invitations, rematches and a leaderboard.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
