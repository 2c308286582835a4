//! UseCase: 切断処理
//!
//! 進行中の 2 人対戦からの切断は強制敗北として扱います。残った
//! プレイヤーを勝者として記録し（決着 1 回につき記録 1 回）、
//! ルームの後始末は Repository 側の単一トランジションで済ませます。
//! 退去通知やロビーの再配信は呼び出し側（UI 層）の仕事です。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Departure, HubRepository, MessagePusher, StatsRepository, Winner,
};

use super::record_game_result;

/// 切断処理のユースケース
pub struct DisconnectPlayerUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    stats: Arc<dyn StatsRepository>,
}

impl DisconnectPlayerUseCase {
    pub fn new(
        repository: Arc<dyn HubRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        stats: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            stats,
        }
    }

    /// 切断を実行し、後続のブロードキャストに必要な情報を返す
    pub async fn execute(&self, connection_id: &ConnectionId) -> Departure {
        let departure = self.repository.handle_disconnect(connection_id).await;

        if let Departure::Forfeit {
            winner,
            players,
            game_type,
            leaver_username,
            ..
        } = &departure
        {
            tracing::info!(
                "Player '{}' left mid-game, '{}' wins by forfeit",
                leaver_username,
                winner.username
            );
            record_game_result(
                &self.stats,
                Winner::from_role(winner.role),
                players.clone(),
                *game_type,
            )
            .await;
        }

        self.message_pusher.unregister_client(connection_id).await;
        departure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameType, PlayerView, Role, StatsError};
    use crate::domain::stats::MockStatsRepository;
    use crate::usecase::test_support::{CapturePusher, conn, now, repository_with_users};

    fn stats_expecting_one_forfeit_record() -> Arc<MockStatsRepository> {
        let mut stats = MockStatsRepository::new();
        stats
            .expect_record_game_result()
            .withf(|winner, players: &Vec<PlayerView>, game_type| {
                *winner == Winner::O
                    && players.len() == 2
                    && *game_type == GameType::TicTacToe
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        Arc::new(stats)
    }

    async fn in_progress_game(
        repository: &Arc<dyn HubRepository>,
    ) -> crate::domain::RoomId {
        let created = repository
            .create_room(&conn("alice"), None, GameType::TicTacToe, now())
            .await
            .unwrap();
        repository
            .join_room(&conn("bob"), created.room_id, false)
            .await
            .unwrap();
        created.room_id
    }

    #[tokio::test]
    async fn test_disconnect_mid_game_records_forfeit_once() {
        // テスト項目: 進行中の切断で残ったプレイヤーの勝利が 1 回だけ
        //             記録される
        // given (前提条件): alice (X) と bob (O) が対戦中
        let repository = repository_with_users(&["alice", "bob"]).await;
        in_progress_game(&repository).await;
        let stats = stats_expecting_one_forfeit_record();
        let usecase = DisconnectPlayerUseCase::new(
            Arc::clone(&repository),
            Arc::new(CapturePusher::default()),
            stats,
        );

        // when (操作): alice が切断する
        let departure = usecase.execute(&conn("alice")).await;

        // then (期待する結果): 強制敗北として報告され、ルームは消えている
        assert!(matches!(departure, Departure::Forfeit { .. }));
        assert!(repository.rooms_list().await.is_empty());
        // MockStatsRepository の times(1) が記録回数を検証する
    }

    #[tokio::test]
    async fn test_disconnect_from_lobby_records_nothing() {
        // テスト項目: ロビーからの切断では何も記録されない
        // given (前提条件):
        let repository = repository_with_users(&["alice"]).await;
        let mut mock = MockStatsRepository::new();
        mock.expect_record_game_result().times(0);
        let usecase = DisconnectPlayerUseCase::new(
            Arc::clone(&repository),
            Arc::new(CapturePusher::default()),
            Arc::new(mock),
        );

        // when (操作):
        let departure = usecase.execute(&conn("alice")).await;

        // then (期待する結果):
        assert!(matches!(departure, Departure::NotInRoom));
        assert!(repository.lobby_state().await.users.is_empty());
    }

    #[tokio::test]
    async fn test_stats_failure_does_not_block_disconnect() {
        // テスト項目: 統計書き込みの失敗があっても切断処理は完了する
        // given (前提条件):
        let repository = repository_with_users(&["alice", "bob"]).await;
        in_progress_game(&repository).await;
        let mut mock = MockStatsRepository::new();
        mock.expect_record_game_result()
            .times(1)
            .returning(|_, _, _| Err(StatsError::WriteFailed("db down".to_string())));
        let usecase = DisconnectPlayerUseCase::new(
            Arc::clone(&repository),
            Arc::new(CapturePusher::default()),
            Arc::new(mock),
        );

        // when (操作):
        let departure = usecase.execute(&conn("bob")).await;

        // then (期待する結果): 失敗は握りつぶされ、強制敗北自体は成立する
        let Departure::Forfeit { winner, .. } = departure else {
            panic!("expected a forfeit");
        };
        assert_eq!(winner.role, Role::X);
        assert!(repository.rooms_list().await.is_empty());
    }
}
