//! UseCase: 対戦の招待
//!
//! 受信者ごとに保留できる招待は 1 件だけで、新しい招待が古いものを
//! 上書きします。承諾すると送信者を X、承諾者を O とする 2 人入りの
//! ルームが原子的に作られます（どちらかの追加に失敗したら何も
//! コミットされない）。

use std::sync::Arc;

use asobiba_shared::time::get_jst_timestamp;

use crate::domain::{
    ConnectionId, GameType, HubError, HubRepository, InvitationAccepted, InvitationDeclined,
    InvitationSent, Timestamp,
};

/// 招待のユースケース
pub struct InvitationUseCase {
    repository: Arc<dyn HubRepository>,
}

impl InvitationUseCase {
    pub fn new(repository: Arc<dyn HubRepository>) -> Self {
        Self { repository }
    }

    /// 招待を送る。受信者はオンラインかつどのルームにもいないこと
    pub async fn send(
        &self,
        connection_id: &ConnectionId,
        to: &str,
        game_type: GameType,
    ) -> Result<InvitationSent, HubError> {
        self.repository
            .send_invitation(connection_id, to, game_type)
            .await
    }

    /// 招待を承諾する
    pub async fn accept(
        &self,
        connection_id: &ConnectionId,
        from: &str,
    ) -> Result<InvitationAccepted, HubError> {
        let now = Timestamp::new(get_jst_timestamp());
        self.repository
            .accept_invitation(connection_id, from, now)
            .await
    }

    /// 招待を辞退する
    pub async fn decline(
        &self,
        connection_id: &ConnectionId,
        from: &str,
    ) -> Result<InvitationDeclined, HubError> {
        self.repository.decline_invitation(connection_id, from).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::usecase::test_support::{conn, repository_with_users};

    #[tokio::test]
    async fn test_accept_builds_two_player_room() {
        // テスト項目: 承諾で送信者 X・承諾者 O の 2 人入りルームができる
        // given (前提条件):
        let repository = repository_with_users(&["alice", "carol"]).await;
        let usecase = InvitationUseCase::new(Arc::clone(&repository));
        usecase
            .send(&conn("alice"), "carol", GameType::TicTacToe)
            .await
            .unwrap();

        // when (操作):
        let accepted = usecase.accept(&conn("carol"), "alice").await.unwrap();

        // then (期待する結果):
        assert_eq!(accepted.sender_player.role, Role::X);
        assert_eq!(accepted.acceptor_player.role, Role::O);
        assert_eq!(accepted.room_name, "alice vs carol");
        assert_eq!(accepted.first_turn, Role::X);
        assert_eq!(repository.rooms_list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_decline_reports_sender_connection() {
        // テスト項目: 辞退すると送信者への通知対象が返り、招待は消える
        // given (前提条件):
        let repository = repository_with_users(&["alice", "carol"]).await;
        let usecase = InvitationUseCase::new(Arc::clone(&repository));
        usecase
            .send(&conn("alice"), "carol", GameType::TicTacToe)
            .await
            .unwrap();

        // when (操作):
        let declined = usecase.decline(&conn("carol"), "alice").await.unwrap();

        // then (期待する結果):
        assert_eq!(declined.sender_connection, Some(conn("alice")));
        // 辞退後の承諾はもうできない
        let stale = usecase.accept(&conn("carol"), "alice").await;
        assert_eq!(stale.unwrap_err(), HubError::InvitationNotFound);
    }

    #[tokio::test]
    async fn test_send_to_offline_user_fails() {
        // テスト項目: オフラインの相手への招待は失敗する
        // given (前提条件):
        let repository = repository_with_users(&["alice"]).await;
        let usecase = InvitationUseCase::new(Arc::clone(&repository));

        // when (操作):
        let result = usecase
            .send(&conn("alice"), "nobody", GameType::TicTacToe)
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            HubError::UserOffline("nobody".to_string())
        );
    }
}
