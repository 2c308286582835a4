//! InMemory Game Hub Repository 実装
//!
//! ドメイン層が定義する HubRepository trait の具体的な実装。
//! `GameHub` 集約を単一の非同期 Mutex で包み、すべての状態遷移を
//! 直列化します。1 回のロックの中で検証と変更が完結するため、
//! ハンドラ間でルーム状態の変更が交錯することはありません。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChoiceOutcome, ConnectionId, Departure, EvictionReport, FlipApplied, GameHub, GameType,
    HubError, HubRepository, InvitationAccepted, InvitationDeclined, InvitationSent, JoinOutcome,
    LobbyMessage, LobbyState, MoveApplied, RestartOutcome, Role, RoomChat, RoomCreated, RoomId,
    RoomInfo, RoomName, RpsChoice, StateRefresh, Timestamp, Username,
};

/// インメモリ Game Hub Repository 実装
pub struct InMemoryHubRepository {
    hub: Arc<Mutex<GameHub>>,
}

impl InMemoryHubRepository {
    pub fn new(hub: Arc<Mutex<GameHub>>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl HubRepository for InMemoryHubRepository {
    async fn register_user(
        &self,
        connection_id: ConnectionId,
        username: Username,
    ) -> Vec<LobbyMessage> {
        let mut hub = self.hub.lock().await;
        hub.register_user(connection_id, username)
    }

    async fn handle_disconnect(&self, connection_id: &ConnectionId) -> Departure {
        let mut hub = self.hub.lock().await;
        hub.handle_disconnect(connection_id)
    }

    async fn leave_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<Departure, HubError> {
        let mut hub = self.hub.lock().await;
        hub.leave_room(connection_id, room_id)
    }

    async fn lobby_state(&self) -> LobbyState {
        let hub = self.hub.lock().await;
        hub.lobby_state()
    }

    async fn all_connections(&self) -> Vec<ConnectionId> {
        let hub = self.hub.lock().await;
        hub.all_connections()
    }

    async fn rooms_list(&self) -> Vec<RoomInfo> {
        let hub = self.hub.lock().await;
        hub.rooms_list()
    }

    async fn create_room(
        &self,
        connection_id: &ConnectionId,
        room_name: Option<RoomName>,
        game_type: GameType,
        now: Timestamp,
    ) -> Result<RoomCreated, HubError> {
        let mut hub = self.hub.lock().await;
        hub.create_room(connection_id, room_name, game_type, now)
    }

    async fn join_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        as_spectator: bool,
    ) -> Result<JoinOutcome, HubError> {
        let mut hub = self.hub.lock().await;
        hub.join_room(connection_id, room_id, as_spectator)
    }

    async fn make_move(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        cell: usize,
        claimed_role: Role,
    ) -> Result<MoveApplied, HubError> {
        let mut hub = self.hub.lock().await;
        hub.make_move(connection_id, room_id, cell, claimed_role)
    }

    async fn submit_choice(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        choice: RpsChoice,
    ) -> Result<ChoiceOutcome, HubError> {
        let mut hub = self.hub.lock().await;
        hub.submit_choice(connection_id, room_id, choice)
    }

    async fn flip_card(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        card_id: usize,
    ) -> Result<FlipApplied, HubError> {
        let mut hub = self.hub.lock().await;
        hub.flip_card(connection_id, room_id, card_id)
    }

    async fn hide_cards(&self, room_id: RoomId, ids: Vec<usize>) -> Option<StateRefresh> {
        let mut hub = self.hub.lock().await;
        hub.hide_cards(room_id, &ids)
    }

    async fn request_restart(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<RestartOutcome, HubError> {
        let mut hub = self.hub.lock().await;
        hub.request_restart(connection_id, room_id)
    }

    async fn evict_spectators(&self, room_id: RoomId) -> Option<EvictionReport> {
        let mut hub = self.hub.lock().await;
        hub.evict_spectators(room_id)
    }

    async fn send_invitation(
        &self,
        connection_id: &ConnectionId,
        to: &str,
        game_type: GameType,
    ) -> Result<InvitationSent, HubError> {
        let mut hub = self.hub.lock().await;
        hub.send_invitation(connection_id, to, game_type)
    }

    async fn accept_invitation(
        &self,
        connection_id: &ConnectionId,
        from: &str,
        now: Timestamp,
    ) -> Result<InvitationAccepted, HubError> {
        let mut hub = self.hub.lock().await;
        hub.accept_invitation(connection_id, from, now)
    }

    async fn decline_invitation(
        &self,
        connection_id: &ConnectionId,
        from: &str,
    ) -> Result<InvitationDeclined, HubError> {
        let mut hub = self.hub.lock().await;
        hub.decline_invitation(connection_id, from)
    }

    async fn push_lobby_message(
        &self,
        connection_id: &ConnectionId,
        message: &str,
        timestamp: Timestamp,
    ) -> Result<(LobbyMessage, Vec<ConnectionId>), HubError> {
        let mut hub = self.hub.lock().await;
        hub.push_lobby_message(connection_id, message, timestamp)
    }

    async fn room_chat(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        message: &str,
        timestamp: Timestamp,
    ) -> Result<RoomChat, HubError> {
        let hub = self.hub.lock().await;
        hub.room_chat(connection_id, room_id, message, timestamp)
    }

    async fn snapshot(&self) -> GameHub {
        let hub = self.hub.lock().await;
        hub.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryHubRepository がロック越しに GameHub へ正しく委譲すること
    // - 1 メソッド = 1 回の排他アクセスで検証と変更が完結すること
    //
    // 【なぜこのテストが必要か】
    // - Repository は UseCase から呼ばれるデータアクセス層の中核
    // - 集約メソッドの細かい仕様は domain 側のテストが持つので、
    //   ここでは配線（委譲とロック）だけを確認する
    // ========================================

    fn create_test_repository() -> InMemoryHubRepository {
        InMemoryHubRepository::new(Arc::new(Mutex::new(GameHub::new())))
    }

    fn conn(label: &str) -> ConnectionId {
        ConnectionId::new(format!("conn-{label}"))
    }

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_create_room() {
        // テスト項目: 登録した接続でルームを作成できる
        // given (前提条件):
        let repo = create_test_repository();
        repo.register_user(conn("alice"), user("alice")).await;

        // when (操作):
        let created = repo
            .create_room(
                &conn("alice"),
                None,
                GameType::TicTacToe,
                Timestamp::new(0),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(repo.rooms_list().await.len(), 1);
        assert_eq!(
            repo.rooms_list().await[0].room_id,
            created.room_id
        );
    }

    #[tokio::test]
    async fn test_unregistered_connection_cannot_create_room() {
        // テスト項目: 未登録の接続からのルーム作成は拒否される
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let result = repo
            .create_room(
                &conn("ghost"),
                None,
                GameType::TicTacToe,
                Timestamp::new(0),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(HubError::UnknownConnection)));
    }

    #[tokio::test]
    async fn test_lobby_state_reflects_connections() {
        // テスト項目: ロビー状態にオンラインユーザーが反映される
        // given (前提条件):
        let repo = create_test_repository();
        repo.register_user(conn("alice"), user("alice")).await;
        repo.register_user(conn("bob"), user("bob")).await;

        // when (操作):
        let lobby = repo.lobby_state().await;

        // then (期待する結果):
        assert_eq!(lobby.users.len(), 2);
        assert!(lobby.users.contains(&"alice".to_string()));
        assert!(lobby.users.contains(&"bob".to_string()));
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_copy() {
        // テスト項目: スナップショットは後の変更の影響を受けない
        // given (前提条件):
        let repo = create_test_repository();
        repo.register_user(conn("alice"), user("alice")).await;

        // when (操作):
        let before = repo.snapshot().await;
        repo.register_user(conn("bob"), user("bob")).await;

        // then (期待する結果):
        assert_eq!(before.all_connections().len(), 1);
        assert_eq!(repo.snapshot().await.all_connections().len(), 2);
    }
}
