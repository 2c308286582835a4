//! ドメイン層
//!
//! ゲームハブの中核となるモデルとルール。Infrastructure 層・UI 層には
//! 依存せず、必要なインターフェース（Repository / MessagePusher /
//! StatsRepository）は自分で定義します。

pub mod entity;
pub mod error;
pub mod game;
pub mod pusher;
pub mod repository;
pub mod stats;
pub mod value_object;

pub use entity::hub::{
    ChoiceOutcome, Departure, EvictionReport, FinishedGame, FlipApplied, GameHub, Invitation,
    InvitationAccepted, InvitationDeclined, InvitationSent, JoinOutcome, LOBBY_MESSAGE_CAP,
    LobbyMessage, LobbyState, MoveApplied, RestartOutcome, RoomChat, RoomCreated, StateRefresh,
};
pub use entity::room::{
    GameStateView, MemoryCardView, MemoryView, Player, PlayerView, Removal, RestartReport, Room,
    RoomInfo, RoomStatus, Spectator, SpectatorView,
};
pub use error::{GameError, HubError, MessagePushError, RoomError, StatsError};
pub use game::{
    FlipReport, GameState, MemoryCard, MemoryState, RoleScores, RpsChoice, RpsProgress,
    RpsRoundReport, RpsState, TicTacToeState, TttMoveReport, Winner,
};
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::HubRepository;
pub use stats::{PlayerStanding, StatsRepository};
pub use value_object::{
    ConnectionId, GameType, InvalidValue, Role, RoomId, RoomName, Timestamp, USERNAME_MAX_CHARS,
    Username,
};
