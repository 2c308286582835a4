//! ドメイン層のエラー定義
//!
//! プレイヤーに返す拒否理由はすべてここの `Display` 文字列になります。
//! ソケット境界を panic が越えることはなく、拒否は常に値として返します。

use thiserror::Error;

use super::value_object::GameType;

/// ゲームエンジン内の検証エラー（不正な手）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Game is not in progress")]
    NotInProgress,
    #[error("Cell already occupied")]
    CellOccupied,
    #[error("Invalid move")]
    InvalidMove,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Game is already finished")]
    AlreadyFinished,
    #[error("Waiting for second player to start the game")]
    WaitingForOpponent,
    #[error("Game has not started yet")]
    NotStarted,
    #[error("Game finished")]
    Finished,
    #[error("Already flipped 2 cards, wait for result")]
    PairPending,
    #[error("Card cannot be flipped")]
    CardUnavailable,
}

/// ルーム操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,
    #[error("Game has already started")]
    GameAlreadyStarted,
    #[error("Room is not running {0}")]
    WrongGame(GameType),
    #[error("Player not found in room")]
    NotAPlayer,
    #[error("Game is not finished")]
    NotFinished,
    #[error(transparent)]
    Game(#[from] GameError),
}

/// レジストリ（GameHub）操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Room does not exist")]
    RoomNotFound,
    #[error("You are already in this room")]
    AlreadyInRoom,
    #[error("You are already in a game")]
    AlreadyInGame,
    #[error("Game has finished")]
    RoomClosed,
    #[error("You are not in this room")]
    NotInRoom,
    #[error("{0} is not online")]
    UserOffline(String),
    #[error("{0} is already in a game")]
    UserBusy(String),
    #[error("Invitation not found or expired")]
    InvitationNotFound,
    #[error("{0} is no longer online")]
    SenderGone(String),
    #[error("Message must not be empty")]
    EmptyMessage,
    #[error("Unknown connection")]
    UnknownConnection,
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl From<GameError> for HubError {
    fn from(e: GameError) -> Self {
        Self::Room(RoomError::Game(e))
    }
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Error)]
pub enum MessagePushError {
    #[error("client not found: {0}")]
    ClientNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 統計ストア（Persistence Gateway）のエラー
///
/// 呼び出し側はこのエラーをログに残して握りつぶします。ゲーム進行を
/// 統計書き込みの失敗でブロックしてはいけません。
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to record game result: {0}")]
    WriteFailed(String),
    #[error("failed to read stats: {0}")]
    ReadFailed(String),
}
