//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 原子性について
//!
//! 各メソッドは 1 回の排他アクセスの中で検証と変更を完結させます。
//! 細かい操作を UseCase 側で組み合わせると検証と変更の間に別の
//! イベントが割り込めてしまうため、トランジション単位で切っています。

use async_trait::async_trait;

use super::entity::hub::{
    ChoiceOutcome, Departure, EvictionReport, FlipApplied, GameHub, InvitationAccepted,
    InvitationDeclined, InvitationSent, JoinOutcome, LobbyMessage, LobbyState, MoveApplied,
    RestartOutcome, RoomChat, RoomCreated, StateRefresh,
};
use super::entity::room::RoomInfo;
use super::error::HubError;
use super::game::RpsChoice;
use super::value_object::{ConnectionId, GameType, Role, RoomId, RoomName, Timestamp, Username};

/// Game Hub Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な
/// 実装（インメモリ実装）には依存しない。
#[async_trait]
pub trait HubRepository: Send + Sync {
    /// 接続を登録し、ロビーチャット履歴を返す
    async fn register_user(
        &self,
        connection_id: ConnectionId,
        username: Username,
    ) -> Vec<LobbyMessage>;

    /// 切断処理（必要なら強制敗北）
    async fn handle_disconnect(&self, connection_id: &ConnectionId) -> Departure;

    /// 明示的な退室
    async fn leave_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<Departure, HubError>;

    /// ロビーの状態（公開中ルーム + オンラインユーザー）
    async fn lobby_state(&self) -> LobbyState;

    /// 全オンライン接続
    async fn all_connections(&self) -> Vec<ConnectionId>;

    /// 公開中のルーム一覧
    async fn rooms_list(&self) -> Vec<RoomInfo>;

    /// ルームを作成し、作成者を最初のプレイヤーとして登録する
    async fn create_room(
        &self,
        connection_id: &ConnectionId,
        room_name: Option<RoomName>,
        game_type: GameType,
        now: Timestamp,
    ) -> Result<RoomCreated, HubError>;

    /// プレイヤーまたは観戦者としてルームに参加する
    async fn join_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        as_spectator: bool,
    ) -> Result<JoinOutcome, HubError>;

    /// 三目並べの 1 手
    async fn make_move(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        cell: usize,
        claimed_role: Role,
    ) -> Result<MoveApplied, HubError>;

    /// じゃんけんの手の提出
    async fn submit_choice(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        choice: RpsChoice,
    ) -> Result<ChoiceOutcome, HubError>;

    /// 神経衰弱のカードめくり
    async fn flip_card(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        card_id: usize,
    ) -> Result<FlipApplied, HubError>;

    /// 不一致ペアを裏に戻す（遅延タイマーから。ルームが無ければ None）
    async fn hide_cards(&self, room_id: RoomId, ids: Vec<usize>) -> Option<StateRefresh>;

    /// 再戦投票
    async fn request_restart(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<RestartOutcome, HubError>;

    /// 決着後の観戦者退去（遅延タイマーから。ルームが無ければ None）
    async fn evict_spectators(&self, room_id: RoomId) -> Option<EvictionReport>;

    /// 招待を送る
    async fn send_invitation(
        &self,
        connection_id: &ConnectionId,
        to: &str,
        game_type: GameType,
    ) -> Result<InvitationSent, HubError>;

    /// 招待を承諾し、2 人入りのルームを原子的に作る
    async fn accept_invitation(
        &self,
        connection_id: &ConnectionId,
        from: &str,
        now: Timestamp,
    ) -> Result<InvitationAccepted, HubError>;

    /// 招待を辞退する
    async fn decline_invitation(
        &self,
        connection_id: &ConnectionId,
        from: &str,
    ) -> Result<InvitationDeclined, HubError>;

    /// ロビーチャットに追加する
    async fn push_lobby_message(
        &self,
        connection_id: &ConnectionId,
        message: &str,
        timestamp: Timestamp,
    ) -> Result<(LobbyMessage, Vec<ConnectionId>), HubError>;

    /// ルームチャットの配信内容を作る
    async fn room_chat(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        message: &str,
        timestamp: Timestamp,
    ) -> Result<RoomChat, HubError>;

    /// レジストリ全体のスナップショット（デバッグ用）
    async fn snapshot(&self) -> GameHub;
}
