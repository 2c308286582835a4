//! InMemory Scoreboard 実装
//!
//! ドメイン層が定義する StatsRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 技術的負債
//!
//! 現在、勝敗カウンタをプロセス内にしか保持していません。これは
//! InMemory 実装では許容される妥協ですが、将来 PostgreSQL などの
//! DBMS を実装する際は、以下の変換層が必要になります：
//!
//! ```text
//! DB Row/JSON → StatsRecordData (DTO) → StatsRecord (ドメインモデル)
//! ```
//!
//! DBMS 実装時に対応予定。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    GameType, PlayerStanding, PlayerView, StatsError, StatsRepository, Winner,
};

/// ゲーム種別ごとの勝敗カウンタ
#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    wins: u64,
    losses: u64,
    draws: u64,
}

impl Counts {
    fn total(&self) -> u64 {
        self.wins + self.losses + self.draws
    }
}

/// ユーザー 1 人分の記録（ユーザー名は小文字で正規化して保持）
#[derive(Debug, Clone, Default)]
struct StatsRecord {
    overall: Counts,
    per_game: HashMap<GameType, Counts>,
    badges: Vec<String>,
}

/// インメモリ Scoreboard 実装
#[derive(Default)]
pub struct InMemoryScoreboard {
    records: Mutex<HashMap<String, StatsRecord>>,
}

impl InMemoryScoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// バッジの再計算。勝敗を書き込むたびに呼ばれる
    fn recompute_badges(record: &mut StatsRecord) {
        let mut badges = Vec::new();
        let total = record.overall.total();
        if record.overall.wins >= 1 {
            badges.push("first-win".to_string());
        }
        if record.overall.wins >= 10 {
            badges.push("champion".to_string());
        }
        if total >= 25 {
            badges.push("seasoned".to_string());
        }
        if total >= 10 && record.overall.wins * 100 >= total * 70 {
            badges.push("dominator".to_string());
        }
        record.badges = badges;
    }

    fn win_rate(counts: &Counts) -> f64 {
        let total = counts.total();
        if total == 0 {
            return 0.0;
        }
        // 小数第 1 位までに丸める
        (counts.wins as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

#[async_trait]
impl StatsRepository for InMemoryScoreboard {
    async fn record_game_result(
        &self,
        winner: Winner,
        players: Vec<PlayerView>,
        game_type: GameType,
    ) -> Result<(), StatsError> {
        if players.len() != 2 {
            return Err(StatsError::WriteFailed(format!(
                "expected 2 players, got {}",
                players.len()
            )));
        }

        let mut records = self.records.lock().await;
        for player in &players {
            let key = player.username.to_lowercase();
            let record = records.entry(key).or_default();
            let game = record.per_game.entry(game_type).or_default();
            match winner.role() {
                None => {
                    record.overall.draws += 1;
                    game.draws += 1;
                }
                Some(winner_role) if winner_role == player.role => {
                    record.overall.wins += 1;
                    game.wins += 1;
                }
                Some(_) => {
                    record.overall.losses += 1;
                    game.losses += 1;
                }
            }
            Self::recompute_badges(record);
        }
        Ok(())
    }

    async fn top_players(&self, limit: usize) -> Result<Vec<PlayerStanding>, StatsError> {
        let records = self.records.lock().await;
        let mut standings: Vec<PlayerStanding> = records
            .iter()
            .map(|(username, record)| PlayerStanding {
                username: username.clone(),
                wins: record.overall.wins,
                losses: record.overall.losses,
                draws: record.overall.draws,
                total_games: record.overall.total(),
                win_rate: Self::win_rate(&record.overall),
                badges: record.badges.clone(),
            })
            .collect();

        // 勝利数 → 勝率 → 総ゲーム数の順で並べる
        standings.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then(b.win_rate.total_cmp(&a.win_rate))
                .then(b.total_games.cmp(&a.total_games))
        });
        standings.truncate(limit);
        Ok(standings)
    }
}
