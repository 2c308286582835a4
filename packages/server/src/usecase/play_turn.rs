//! UseCase: ゲーム操作（着手・手の提出・カードめくり）
//!
//! ゲーム種別ごとの操作を Repository にルーティングし、決着時の
//! 後処理をここで一元化します：
//!
//! - 統計ストアへの記録は決着 1 回につきちょうど 1 回（ラウンドごとには
//!   記録しない）
//! - 決着から一定の猶予の後、観戦者を退去させる
//! - 神経衰弱の不一致ペアは一定時間後に裏へ戻す
//!
//! 遅延処理は fire-and-forget のタスクで、発火時にルームがまだ存在し
//! 期待した状態かを Repository 側で確認してから作用します。タイマーは
//! 消えたルームを蘇らせないし、同じ効果を二重に適用することもない。

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    ChoiceOutcome, ConnectionId, FinishedGame, FlipApplied, HubError, HubRepository,
    MessagePusher, MoveApplied, Role, RoomId, RpsChoice, StatsRepository,
};
use crate::infrastructure::dto::websocket::{GameFinishedMessage, GameStateMessage, MessageType};

use super::{broadcast_lobby, record_game_result};

/// 不一致ペアを裏に戻すまでの遅延
pub const PENDING_HIDE_DELAY: Duration = Duration::from_millis(1200);

/// 決着から観戦者退去までの猶予
pub const SPECTATOR_EVICTION_GRACE: Duration = Duration::from_secs(3);

/// ゲーム操作のユースケース
pub struct PlayTurnUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    stats: Arc<dyn StatsRepository>,
}

impl PlayTurnUseCase {
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

    /// 三目並べの 1 手
    pub async fn make_move(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        cell: usize,
        claimed_role: Role,
    ) -> Result<MoveApplied, HubError> {
        let applied = self
            .repository
            .make_move(connection_id, room_id, cell, claimed_role)
            .await?;
        if let Some(finished) = &applied.finished {
            self.finish_game(room_id, finished).await;
        }
        Ok(applied)
    }

    /// じゃんけんの手の提出
    pub async fn submit_choice(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        choice: RpsChoice,
    ) -> Result<ChoiceOutcome, HubError> {
        let outcome = self
            .repository
            .submit_choice(connection_id, room_id, choice)
            .await?;
        if let ChoiceOutcome::Resolved {
            finished: Some(finished),
            ..
        } = &outcome
        {
            self.finish_game(room_id, finished).await;
        }
        Ok(outcome)
    }

    /// 神経衰弱のカードめくり
    pub async fn flip_card(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        card_id: usize,
    ) -> Result<FlipApplied, HubError> {
        let applied = self
            .repository
            .flip_card(connection_id, room_id, card_id)
            .await?;
        if let Some(finished) = &applied.finished {
            self.finish_game(room_id, finished).await;
        }
        if let Some(cards) = applied.pending_hide {
            self.schedule_pending_hide(room_id, cards);
        }
        Ok(applied)
    }

    /// 決着の後処理（記録 + 観戦者退去の予約）
    async fn finish_game(&self, room_id: RoomId, finished: &FinishedGame) {
        record_game_result(
            &self.stats,
            finished.winner,
            finished.players.clone(),
            finished.game_type,
        )
        .await;
        self.schedule_spectator_eviction(room_id);
    }

    /// 不一致ペアを一定時間後に裏へ戻し、最新状態を再配信する
    fn schedule_pending_hide(&self, room_id: RoomId, cards: [usize; 2]) {
        let repository = Arc::clone(&self.repository);
        let message_pusher = Arc::clone(&self.message_pusher);
        tokio::spawn(async move {
            tokio::time::sleep(PENDING_HIDE_DELAY).await;
            // 発火時点でルームが消えていれば何もしない
            let Some(refresh) = repository.hide_cards(room_id, cards.to_vec()).await else {
                return;
            };
            let json = serde_json::to_string(&GameStateMessage {
                r#type: MessageType::GameState,
                room_id,
                state: refresh.game_state,
            })
            .unwrap();
            if let Err(e) = message_pusher.broadcast(refresh.targets, &json).await {
                tracing::warn!("Failed to broadcast state after card hide: {}", e);
            }
        });
    }

    /// 決着の猶予期間後に観戦者を退去させ、ロビーを再配信する
    fn schedule_spectator_eviction(&self, room_id: RoomId) {
        let repository = Arc::clone(&self.repository);
        let message_pusher = Arc::clone(&self.message_pusher);
        tokio::spawn(async move {
            tokio::time::sleep(SPECTATOR_EVICTION_GRACE).await;
            // ルームは強制敗北などで既に消えていることがある
            let Some(report) = repository.evict_spectators(room_id).await else {
                return;
            };
            let json = serde_json::to_string(&GameFinishedMessage {
                r#type: MessageType::GameFinished,
                room_id,
                winner: report.winner.clone(),
                reason: "game_ended".to_string(),
                force_leave: true,
            })
            .unwrap();
            for connection in &report.evicted {
                if let Err(e) = message_pusher.push_to(connection, &json).await {
                    tracing::warn!(
                        "Failed to notify evicted spectator '{}': {}",
                        connection,
                        e
                    );
                }
            }
            broadcast_lobby(&repository, &message_pusher).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::memory::DECK_SIZE;
    use crate::domain::stats::MockStatsRepository;
    use crate::domain::{FlipReport, GameType, RoomStatus, Winner};
    use crate::usecase::test_support::{CapturePusher, conn, now, repository_with_users};

    async fn rps_room(repository: &Arc<dyn HubRepository>) -> RoomId {
        let created = repository
            .create_room(&conn("alice"), None, GameType::RockPaperScissors, now())
            .await
            .unwrap();
        repository
            .join_room(&conn("bob"), created.room_id, false)
            .await
            .unwrap();
        created.room_id
    }

    fn no_stats() -> Arc<MockStatsRepository> {
        let mut mock = MockStatsRepository::new();
        mock.expect_record_game_result().times(0);
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_round_results_are_not_recorded() {
        // テスト項目: ラウンド決着だけでは統計に記録されない
        // given (前提条件):
        let repository = repository_with_users(&["alice", "bob"]).await;
        let room_id = rps_room(&repository).await;
        let usecase = PlayTurnUseCase::new(
            Arc::clone(&repository),
            Arc::new(CapturePusher::default()),
            no_stats(),
        );

        // when (操作): 1 ラウンドだけ解決する
        usecase
            .submit_choice(&conn("alice"), room_id, RpsChoice::Rock)
            .await
            .unwrap();
        let outcome = usecase
            .submit_choice(&conn("bob"), room_id, RpsChoice::Scissors)
            .await
            .unwrap();

        // then (期待する結果): 解決はされたが決着ではない
        let ChoiceOutcome::Resolved { finished, .. } = outcome else {
            panic!("expected a resolved round");
        };
        assert!(finished.is_none());
        // MockStatsRepository の times(0) が未記録を検証する
    }

    #[tokio::test]
    async fn test_game_finish_recorded_exactly_once() {
        // テスト項目: 決着でちょうど 1 回だけ統計に記録される
        // given (前提条件):
        let repository = repository_with_users(&["alice", "bob"]).await;
        let room_id = rps_room(&repository).await;
        let mut mock = MockStatsRepository::new();
        mock.expect_record_game_result()
            .withf(|winner, _, game_type| {
                *winner == Winner::X && *game_type == GameType::RockPaperScissors
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let usecase = PlayTurnUseCase::new(
            Arc::clone(&repository),
            Arc::new(CapturePusher::default()),
            Arc::new(mock),
        );

        // when (操作): alice (X) が 5 連勝する
        for _ in 0..5 {
            usecase
                .submit_choice(&conn("alice"), room_id, RpsChoice::Rock)
                .await
                .unwrap();
            usecase
                .submit_choice(&conn("bob"), room_id, RpsChoice::Scissors)
                .await
                .unwrap();
        }

        // then (期待する結果): times(1) が記録回数を検証する
    }

    #[tokio::test(start_paused = true)]
    async fn test_spectators_evicted_after_grace_period() {
        // テスト項目: 決着から猶予期間の後に観戦者が退去させられる
        // given (前提条件): 観戦者付きの対戦を決着させる
        let repository = repository_with_users(&["alice", "bob", "sam"]).await;
        let room_id = rps_room(&repository).await;
        repository
            .join_room(&conn("sam"), room_id, true)
            .await
            .unwrap();
        let mut mock = MockStatsRepository::new();
        mock.expect_record_game_result()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let pusher = Arc::new(CapturePusher::default());
        let usecase = PlayTurnUseCase::new(
            Arc::clone(&repository),
            Arc::clone(&pusher) as Arc<dyn MessagePusher>,
            Arc::new(mock),
        );
        for _ in 0..5 {
            usecase
                .submit_choice(&conn("alice"), room_id, RpsChoice::Rock)
                .await
                .unwrap();
            usecase
                .submit_choice(&conn("bob"), room_id, RpsChoice::Scissors)
                .await
                .unwrap();
        }

        // when (操作): 猶予期間ぶん時間を進める
        tokio::time::sleep(SPECTATOR_EVICTION_GRACE + Duration::from_millis(100)).await;

        // then (期待する結果): 観戦者に退去通知が届き、対応表から消えている
        let notices = pusher.messages_for(&conn("sam")).await;
        assert!(
            notices.iter().any(|m| m.contains("game-finished")),
            "expected an eviction notice, got {notices:?}"
        );
        let snapshot = repository.snapshot().await;
        assert_eq!(snapshot.room_of_connection(&conn("sam")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_pair_hidden_after_delay() {
        // テスト項目: 不一致ペアが遅延後に裏へ戻り、状態が再配信される
        // given (前提条件): 神経衰弱で不一致を出す
        let repository = repository_with_users(&["alice", "bob"]).await;
        let created = repository
            .create_room(&conn("alice"), None, GameType::MemoryMatch, now())
            .await
            .unwrap();
        let room_id = created.room_id;
        repository
            .join_room(&conn("bob"), room_id, false)
            .await
            .unwrap();
        let pusher = Arc::new(CapturePusher::default());
        let usecase = PlayTurnUseCase::new(
            Arc::clone(&repository),
            Arc::clone(&pusher) as Arc<dyn MessagePusher>,
            no_stats(),
        );

        // 不一致になる 2 枚を探す。スナップショットではシンボルが
        // 伏せられているので、隣同士を順にめくって結果で判定する
        // （一致した場合は手番が維持されるので次のペアへ進む）
        let mut mismatch = None;
        let mut card = 0usize;
        while mismatch.is_none() && card + 1 < DECK_SIZE {
            let first = usecase.flip_card(&conn("alice"), room_id, card).await.unwrap();
            assert!(matches!(first.report, FlipReport::Revealed { .. }));
            let second = usecase
                .flip_card(&conn("alice"), room_id, card + 1)
                .await
                .unwrap();
            if let FlipReport::Mismatch { cards, .. } = second.report {
                mismatch = Some(cards);
            }
            card += 2;
        }
        let cards = mismatch.expect("a mismatch should occur within the deck");

        // when (操作): 遅延ぶん時間を進める
        tokio::time::sleep(PENDING_HIDE_DELAY + Duration::from_millis(100)).await;

        // then (期待する結果): 2 枚とも裏に戻っている
        let snapshot = repository.snapshot().await;
        let room = snapshot.room(room_id).unwrap();
        let view = room.game_state_view();
        let memory = view.memory.unwrap();
        for id in cards {
            assert!(!memory.cards[id].revealed, "card {id} should be hidden");
        }
        assert_eq!(room.status(), RoomStatus::InProgress);
    }
}
