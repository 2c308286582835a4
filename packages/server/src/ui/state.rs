//! Server state shared by the HTTP / WebSocket handlers.

use std::sync::Arc;

use crate::domain::{HubRepository, MessagePusher};
use crate::usecase::{
    ChatUseCase, ConnectPlayerUseCase, CreateRoomUseCase, DisconnectPlayerUseCase,
    InvitationUseCase, JoinRoomUseCase, LeaveRoomUseCase, PlayTurnUseCase, RestartGameUseCase,
    ScoreboardUseCase,
};

/// Shared application state
pub struct AppState {
    pub connect_player_usecase: Arc<ConnectPlayerUseCase>,
    pub disconnect_player_usecase: Arc<DisconnectPlayerUseCase>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub play_turn_usecase: Arc<PlayTurnUseCase>,
    pub restart_game_usecase: Arc<RestartGameUseCase>,
    pub invitation_usecase: Arc<InvitationUseCase>,
    pub chat_usecase: Arc<ChatUseCase>,
    pub scoreboard_usecase: Arc<ScoreboardUseCase>,
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    pub message_pusher: Arc<dyn MessagePusher>,
}
