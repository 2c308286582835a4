//! WebSocket ワイヤフォーマット（DTO）
//!
//! クライアント→サーバはタグ付き JSON の [`ClientCommand`]、
//! サーバ→クライアントはメッセージごとの構造体（`r#type` フィールドで
//! 判別）です。ドメインのスナップショット型（`RoomInfo` /
//! `GameStateView` など）は既にクライアント向けに整形されているので、
//! そのまま埋め込みます。

use serde::{Deserialize, Serialize};

use crate::domain::{
    GameStateView, LobbyMessage, PlayerStanding, PlayerView, Role, RoleScores, RoomId, RoomInfo,
    RpsChoice, Winner,
};

/// クライアントから届くコマンド
///
/// Serialize も導出しているのは CLI クライアントが同じ型で送信する
/// ため。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    CreateRoom {
        room_name: Option<String>,
        game_type: Option<String>,
    },
    JoinRoom {
        room_id: u32,
        #[serde(default)]
        as_spectator: bool,
    },
    MakeMove {
        room_id: u32,
        cell_id: usize,
        role: Role,
    },
    SubmitChoice {
        room_id: u32,
        choice: RpsChoice,
    },
    FlipCard {
        room_id: u32,
        card_id: usize,
    },
    RequestRestart {
        room_id: u32,
    },
    SendInvitation {
        to: String,
        game_type: Option<String>,
    },
    AcceptInvitation {
        from: String,
    },
    DeclineInvitation {
        from: String,
    },
    LeaveRoom {
        room_id: u32,
    },
    LobbyChat {
        message: String,
    },
    RoomChat {
        room_id: u32,
        message: String,
    },
    GetRooms,
    GetScoreboard,
}

/// サーバから送るメッセージの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    RoomsList,
    LobbyUpdate,
    LobbyHistory,
    LobbyMessage,
    RoomMessage,
    RoomCreated,
    PlayerRole,
    JoinedAsSpectator,
    GameStarted,
    GameState,
    RoundResult,
    RpsStatus,
    RpsResult,
    MemoryResult,
    GameRestarted,
    RematchPending,
    GameFinished,
    PlayerDisconnected,
    InvitationReceived,
    InvitationAccepted,
    InvitationDeclined,
    InvitationError,
    MoveError,
    ScoreboardData,
    Error,
}

/// 公開中のルーム一覧
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomsListMessage {
    pub r#type: MessageType,
    pub rooms: Vec<RoomInfo>,
}

/// ロビー状態（ルーム一覧 + オンラインユーザー）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyUpdateMessage {
    pub r#type: MessageType,
    pub rooms: Vec<RoomInfo>,
    pub users: Vec<String>,
}

/// 新規接続に流すロビーチャット履歴
#[derive(Debug, Clone, Serialize)]
pub struct LobbyHistoryMessage {
    pub r#type: MessageType,
    pub messages: Vec<LobbyMessage>,
}

/// ロビーチャット 1 件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyChatMessage {
    pub r#type: MessageType,
    pub username: String,
    pub message: String,
    pub timestamp: i64,
}

/// ルームチャット 1 件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomChatMessage {
    pub r#type: MessageType,
    pub room_id: RoomId,
    pub username: String,
    pub message: String,
    pub timestamp: i64,
}

/// ルーム作成の通知（作成者へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreatedMessage {
    pub r#type: MessageType,
    pub room_id: RoomId,
    pub room_name: String,
    pub player: PlayerView,
    pub game_type: String,
}

/// 座席の割り当て（参加者へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRoleMessage {
    pub r#type: MessageType,
    pub role: Role,
    pub room_name: String,
    pub players: Vec<PlayerView>,
    pub game_type: String,
}

/// 観戦参加の通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedAsSpectatorMessage {
    pub r#type: MessageType,
    pub room: RoomInfo,
    pub game_type: String,
}

/// ゲーム開始（ルーム全体へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStartedMessage {
    pub r#type: MessageType,
    pub first_turn: Role,
    pub players: Vec<PlayerView>,
    pub game_type: String,
}

/// ゲーム状態のフルスナップショット（ルーム全体へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateMessage {
    pub r#type: MessageType,
    pub room_id: RoomId,
    pub state: GameStateView,
}

/// 三目並べのラウンド決着（ゲームは継続）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResultMessage {
    pub r#type: MessageType,
    pub round_winner: Winner,
    pub scores: RoleScores,
}

/// じゃんけんの相手待ち通知（提出者のみ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpsStatusMessage {
    pub r#type: MessageType,
    pub waiting: bool,
}

/// じゃんけんのラウンド結果（ルーム全体へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpsResultMessage {
    pub r#type: MessageType,
    pub choice_x: RpsChoice,
    pub choice_o: RpsChoice,
    pub winner: Winner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_username: Option<String>,
    pub round: u32,
    pub scores: RoleScores,
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_winner: Option<String>,
}

/// 神経衰弱のめくり結果の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryOutcome {
    Revealed,
    Matched,
    Mismatch,
}

/// 神経衰弱のめくり結果（ルーム全体へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryResultMessage {
    pub r#type: MessageType,
    pub room_id: RoomId,
    pub outcome: MemoryOutcome,
    pub cards: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<RoleScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_turn: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

/// 再戦成立（ルーム全体へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRestartedMessage {
    pub r#type: MessageType,
    pub first_turn: Role,
    pub players: Vec<PlayerView>,
    pub game_type: String,
}

/// 再戦投票の受理（投票者のみ、相手待ち）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RematchPendingMessage {
    pub r#type: MessageType,
    pub waiting: bool,
}

/// 決着後の退去通知（観戦者へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFinishedMessage {
    pub r#type: MessageType,
    pub room_id: RoomId,
    pub winner: String,
    pub reason: String,
    pub force_leave: bool,
}

/// 対戦相手の離脱 = 強制敗北の通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDisconnectedMessage {
    pub r#type: MessageType,
    pub username: String,
    pub winner: String,
    pub reason: String,
    pub force_leave: bool,
}

/// 招待の受信（受信者へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationReceivedMessage {
    pub r#type: MessageType,
    pub from: String,
    pub game_type: String,
}

/// 招待の承諾（承諾者へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationAcceptedMessage {
    pub r#type: MessageType,
    pub room_id: RoomId,
    pub room_name: String,
    pub game_type: String,
}

/// 招待の辞退（送信者へ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationDeclinedMessage {
    pub r#type: MessageType,
    pub to: String,
}

/// 招待まわりのエラー（操作した本人のみ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationErrorMessage {
    pub r#type: MessageType,
    pub error: String,
}

/// ゲーム操作の拒否理由（操作した本人のみ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveErrorMessage {
    pub r#type: MessageType,
    pub error: String,
}

/// リーダーボード
#[derive(Debug, Clone, Serialize)]
pub struct ScoreboardDataMessage {
    pub r#type: MessageType,
    pub players: Vec<PlayerStanding>,
}

/// その他のエラー（操作した本人のみ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_command_parses_kebab_case_tags() {
        // テスト項目: コマンドの type タグが kebab-case でパースされる
        // given (前提条件):
        let json = r#"{"type":"join-room","room_id":123456,"as_spectator":true}"#;

        // when (操作):
        let command: ClientCommand = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            ClientCommand::JoinRoom {
                room_id: 123456,
                as_spectator: true,
            }
        );
    }

    #[test]
    fn test_join_room_spectator_flag_defaults_to_false() {
        // テスト項目: as_spectator 省略時は false になる
        // given (前提条件):
        let json = r#"{"type":"join-room","room_id":123456}"#;

        // when (操作):
        let command: ClientCommand = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            ClientCommand::JoinRoom {
                room_id: 123456,
                as_spectator: false,
            }
        );
    }

    #[test]
    fn test_make_move_carries_role() {
        // テスト項目: make-move は座席の申告を運ぶ
        // given (前提条件):
        let json = r#"{"type":"make-move","room_id":1,"cell_id":4,"role":"X"}"#;

        // when (操作):
        let command: ClientCommand = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            ClientCommand::MakeMove {
                room_id: 1,
                cell_id: 4,
                role: Role::X,
            }
        );
    }

    #[test]
    fn test_unit_commands_parse() {
        // テスト項目: ペイロードのないコマンドもパースできる
        let rooms: ClientCommand = serde_json::from_str(r#"{"type":"get-rooms"}"#).unwrap();
        assert_eq!(rooms, ClientCommand::GetRooms);
        let scoreboard: ClientCommand =
            serde_json::from_str(r#"{"type":"get-scoreboard"}"#).unwrap();
        assert_eq!(scoreboard, ClientCommand::GetScoreboard);
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        // テスト項目: 未知のコマンドはパースエラーになる
        let result = serde_json::from_str::<ClientCommand>(r#"{"type":"self-destruct"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_type_serializes_kebab_case() {
        // テスト項目: メッセージ種別が kebab-case で直列化される
        assert_eq!(
            serde_json::to_string(&MessageType::GameState).unwrap(),
            r#""game-state""#
        );
        assert_eq!(
            serde_json::to_string(&MessageType::PlayerDisconnected).unwrap(),
            r#""player-disconnected""#
        );
    }
}
