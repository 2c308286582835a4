//! UseCase 層
//!
//! クライアントのアクション 1 系統につき 1 つの UseCase。各 UseCase は
//! ドメインの trait（HubRepository / MessagePusher / StatsRepository）
//! にのみ依存し、状態遷移の原子性は Repository 側の単一ロックが
//! 保証します。

pub mod chat;
pub mod connect_player;
pub mod create_room;
pub mod disconnect_player;
pub mod invitation;
pub mod join_room;
pub mod leave_room;
pub mod play_turn;
pub mod restart_game;
pub mod scoreboard;

use std::sync::Arc;

pub use chat::ChatUseCase;
pub use connect_player::ConnectPlayerUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_player::DisconnectPlayerUseCase;
pub use invitation::InvitationUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use play_turn::PlayTurnUseCase;
pub use restart_game::RestartGameUseCase;
pub use scoreboard::ScoreboardUseCase;

use crate::domain::{
    GameType, HubRepository, MessagePusher, PlayerView, StatsRepository, Winner,
};
use crate::infrastructure::dto::websocket::{LobbyUpdateMessage, MessageType, RoomsListMessage};

/// 決着したゲームの結果を統計ストアに 1 回だけ書き込む
///
/// 書き込みの失敗はログに残して握りつぶす。ゲーム進行（メモリ上の
/// 状態とブロードキャスト）が正であり、統計はそれに追随するだけ。
pub(crate) async fn record_game_result(
    stats: &Arc<dyn StatsRepository>,
    winner: Winner,
    players: Vec<PlayerView>,
    game_type: GameType,
) {
    if let Err(e) = stats.record_game_result(winner, players, game_type).await {
        tracing::error!("Failed to record game result: {}", e);
    }
}

/// ロビー状態（ルーム一覧 + オンラインユーザー）を全接続に再配信する
pub async fn broadcast_lobby(
    repository: &Arc<dyn HubRepository>,
    message_pusher: &Arc<dyn MessagePusher>,
) {
    let lobby = repository.lobby_state().await;
    let targets = repository.all_connections().await;

    let rooms_json = serde_json::to_string(&RoomsListMessage {
        r#type: MessageType::RoomsList,
        rooms: lobby.rooms.clone(),
    })
    .unwrap();
    let update_json = serde_json::to_string(&LobbyUpdateMessage {
        r#type: MessageType::LobbyUpdate,
        rooms: lobby.rooms,
        users: lobby.users,
    })
    .unwrap();

    if let Err(e) = message_pusher.broadcast(targets.clone(), &rooms_json).await {
        tracing::warn!("Failed to broadcast rooms list: {}", e);
    }
    if let Err(e) = message_pusher.broadcast(targets, &update_json).await {
        tracing::warn!("Failed to broadcast lobby update: {}", e);
    }
}
