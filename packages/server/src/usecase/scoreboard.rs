//! UseCase: リーダーボード取得
//!
//! 統計ストアの読み出しに失敗してもクライアントには空の一覧を返し、
//! エラーはログに残すだけにします。

use std::sync::Arc;

use crate::domain::{PlayerStanding, StatsRepository};

/// ソケット経由のリーダーボード要求で返す行数
pub const SCOREBOARD_LIMIT: usize = 20;

/// リーダーボード取得のユースケース
pub struct ScoreboardUseCase {
    stats: Arc<dyn StatsRepository>,
}

impl ScoreboardUseCase {
    pub fn new(stats: Arc<dyn StatsRepository>) -> Self {
        Self { stats }
    }

    pub async fn top_players(&self, limit: usize) -> Vec<PlayerStanding> {
        match self.stats.top_players(limit).await {
            Ok(standings) => standings,
            Err(e) => {
                tracing::error!("Failed to read scoreboard: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stats::MockStatsRepository;
    use crate::domain::StatsError;

    #[tokio::test]
    async fn test_read_failure_returns_empty_list() {
        // テスト項目: 読み出し失敗時は空のリーダーボードを返す
        // given (前提条件):
        let mut mock = MockStatsRepository::new();
        mock.expect_top_players()
            .times(1)
            .returning(|_| Err(StatsError::ReadFailed("db down".to_string())));
        let usecase = ScoreboardUseCase::new(Arc::new(mock));

        // when (操作):
        let standings = usecase.top_players(SCOREBOARD_LIMIT).await;

        // then (期待する結果):
        assert!(standings.is_empty());
    }

    #[tokio::test]
    async fn test_limit_passed_through() {
        // テスト項目: limit がそのままストアへ渡される
        // given (前提条件):
        let mut mock = MockStatsRepository::new();
        mock.expect_top_players()
            .withf(|limit| *limit == 5)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let usecase = ScoreboardUseCase::new(Arc::new(mock));

        // when (操作) / then (期待する結果):
        usecase.top_players(5).await;
    }
}
