//! 統計ストア（Persistence Gateway）の抽象化
//!
//! 勝敗の記録とリーダーボードの読み出しだけをコアに見せる薄い
//! インターフェース。決着 1 回につき `record_game_result` を
//! ちょうど 1 回呼ぶのは呼び出し側の責務です（ラウンドごとには
//! 呼ばない）。書き込みの失敗でゲーム進行を止めてはいけません。

use async_trait::async_trait;
use serde::Serialize;

use super::entity::room::PlayerView;
use super::error::StatsError;
use super::game::Winner;
use super::value_object::GameType;

/// リーダーボードの 1 行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStanding {
    pub username: String,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub total_games: u64,
    /// 勝率（% 表記、小数第 1 位まで）
    pub win_rate: f64,
    pub badges: Vec<String>,
}

/// Stats Repository trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// 決着したゲームの結果を記録する（引き分けは両者 draw として）
    async fn record_game_result(
        &self,
        winner: Winner,
        players: Vec<PlayerView>,
        game_type: GameType,
    ) -> Result<(), StatsError>;

    /// 上位プレイヤーを取得する
    async fn top_players(&self, limit: usize) -> Result<Vec<PlayerStanding>, StatsError>;
}
