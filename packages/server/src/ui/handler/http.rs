//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::domain::{GameHub, PlayerStanding, RoomInfo};
use crate::ui::state::AppState;
use crate::usecase::scoreboard::SCOREBOARD_LIMIT;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the list of open rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomInfo>> {
    Json(state.repository.rooms_list().await)
}

/// Get the leaderboard
pub async fn get_scoreboard(State(state): State<Arc<AppState>>) -> Json<Vec<PlayerStanding>> {
    Json(state.scoreboard_usecase.top_players(SCOREBOARD_LIMIT).await)
}

/// Debug endpoint to get the whole hub state (for testing purposes)
pub async fn debug_hub_state(State(state): State<Arc<AppState>>) -> Json<GameHub> {
    Json(state.repository.snapshot().await)
}
