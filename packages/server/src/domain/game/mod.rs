//! ゲームエンジン（ルールの実装）
//!
//! ルームが保持するゲーム状態は `gameType` で判別されるタグ付き共用体
//! [`GameState`] です。各エンジンは自分のゲームについてのみ、
//! 手の検証・ラウンド勝敗の判定・ゲーム終了の判定を担当します。
//!
//! ルームメンバーシップや部屋のステータス遷移はエンジンの責務では
//! ありません（`Room` が検証してから委譲します）。

pub mod memory;
pub mod rps;
pub mod tictactoe;

use serde::{Deserialize, Serialize};

use super::value_object::{GameType, Role};

pub use memory::{FlipReport, MemoryCard, MemoryState};
pub use rps::{RpsChoice, RpsProgress, RpsRoundReport, RpsState};
pub use tictactoe::{TicTacToeState, TttMoveReport};

/// 両座席のスコア（ラウンド勝利数 / マッチ数）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleScores {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "O")]
    pub o: u32,
}

impl RoleScores {
    pub fn get(&self, role: Role) -> u32 {
        match role {
            Role::X => self.x,
            Role::O => self.o,
        }
    }

    pub fn add(&mut self, role: Role) {
        match role {
            Role::X => self.x += 1,
            Role::O => self.o += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.x + self.o
    }
}

/// 勝敗の結果（どちらかの座席、または引き分け）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "O")]
    O,
    #[serde(rename = "draw")]
    Draw,
}

impl Winner {
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::X => Self::X,
            Role::O => Self::O,
        }
    }

    /// The winning seat, if the result was not a draw.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::X => Some(Role::X),
            Self::O => Some(Role::O),
            Self::Draw => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw)
    }
}

impl From<Role> for Winner {
    fn from(role: Role) -> Self {
        Self::from_role(role)
    }
}

/// ゲーム種別ごとの状態を持つタグ付き共用体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameState {
    TicTacToe(TicTacToeState),
    RockPaperScissors(RpsState),
    MemoryMatch(MemoryState),
}

impl GameState {
    /// Construct the initial state for a game type.
    ///
    /// The memory-match board is dealt immediately so a lone player can
    /// already see the face-down grid.
    pub fn new(game_type: GameType) -> Self {
        match game_type {
            GameType::TicTacToe => Self::TicTacToe(TicTacToeState::new()),
            GameType::RockPaperScissors => Self::RockPaperScissors(RpsState::new()),
            GameType::MemoryMatch => Self::MemoryMatch(MemoryState::new()),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Self::TicTacToe(_) => GameType::TicTacToe,
            Self::RockPaperScissors(_) => GameType::RockPaperScissors,
            Self::MemoryMatch(_) => GameType::MemoryMatch,
        }
    }

    /// Fresh start when the second player arrives. First turn is always X.
    pub fn start(&mut self) -> Role {
        match self {
            Self::TicTacToe(state) => state.start(),
            Self::RockPaperScissors(state) => state.reset(),
            Self::MemoryMatch(state) => state.redeal(),
        }
        Role::X
    }

    /// Full reset for a rematch. Returns the first turn of the new game:
    /// tic-tac-toe flips the alternating starter, the others restart with X.
    pub fn restart(&mut self) -> Role {
        match self {
            Self::TicTacToe(state) => state.restart(),
            Self::RockPaperScissors(state) => {
                state.reset();
                Role::X
            }
            Self::MemoryMatch(state) => {
                state.redeal();
                Role::X
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_new_matches_game_type() {
        // テスト項目: 生成された状態のゲーム種別が一致する
        for game_type in [
            GameType::TicTacToe,
            GameType::RockPaperScissors,
            GameType::MemoryMatch,
        ] {
            let state = GameState::new(game_type);
            assert_eq!(state.game_type(), game_type);
        }
    }

    #[test]
    fn test_start_first_turn_is_x() {
        // テスト項目: ゲーム開始時の先手は常に X
        for game_type in [
            GameType::TicTacToe,
            GameType::RockPaperScissors,
            GameType::MemoryMatch,
        ] {
            let mut state = GameState::new(game_type);
            assert_eq!(state.start(), Role::X);
        }
    }

    #[test]
    fn test_restart_flips_starter_only_for_tictactoe() {
        // テスト項目: 再戦時の先手は三目並べのみ交代し、他は X に戻る
        // given (前提条件):
        let mut ttt = GameState::new(GameType::TicTacToe);
        let mut rps = GameState::new(GameType::RockPaperScissors);
        let mut memory = GameState::new(GameType::MemoryMatch);
        ttt.start();
        rps.start();
        memory.start();

        // when (操作) / then (期待する結果):
        assert_eq!(ttt.restart(), Role::O);
        assert_eq!(ttt.restart(), Role::X);
        assert_eq!(rps.restart(), Role::X);
        assert_eq!(memory.restart(), Role::X);
    }

    #[test]
    fn test_role_scores_add_and_get() {
        // テスト項目: スコアの加算と参照が座席ごとに独立している
        // given (前提条件):
        let mut scores = RoleScores::default();

        // when (操作):
        scores.add(Role::X);
        scores.add(Role::X);
        scores.add(Role::O);

        // then (期待する結果):
        assert_eq!(scores.get(Role::X), 2);
        assert_eq!(scores.get(Role::O), 1);
        assert_eq!(scores.total(), 3);
    }

    #[test]
    fn test_winner_role_and_draw() {
        // テスト項目: Winner から座席と引き分けが判定できる
        assert_eq!(Winner::from_role(Role::X).role(), Some(Role::X));
        assert_eq!(Winner::Draw.role(), None);
        assert!(Winner::Draw.is_draw());
        assert!(!Winner::O.is_draw());
    }
}
