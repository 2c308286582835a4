//! 三目並べエンジン
//!
//! 3×3 の盤でラウンドを繰り返し、先に 3 ラウンド取った座席が
//! ゲームの勝者になります。ラウンド勝利で盤はリセットされ、公平のため
//! 先手が交代します。引き分けのラウンドでは先手は変わりません。

use serde::{Deserialize, Serialize};

use crate::domain::error::GameError;
use crate::domain::value_object::Role;

use super::{RoleScores, Winner};

/// ゲーム終了に必要なラウンド勝利数
pub const ROUND_WINS_TO_FINISH: u32 = 3;

/// 8 本の勝利ライン（横 3、縦 3、斜め 2）
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 盤のマス数
pub const BOARD_CELLS: usize = 9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicTacToeState {
    board: [Option<Role>; BOARD_CELLS],
    current_turn: Role,
    last_starter: Role,
    scores: RoleScores,
}

/// 1 手適用した結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TttMoveReport {
    pub cell: usize,
    pub role: Role,
    pub round_over: bool,
    pub round_winner: Option<Winner>,
    pub game_over: bool,
    pub game_winner: Option<Role>,
    pub scores: RoleScores,
    /// 次の手番（ゲーム終了時は `None`）
    pub next_turn: Option<Role>,
}

enum RoundOutcome {
    Win(Role),
    Draw,
}

impl TicTacToeState {
    pub fn new() -> Self {
        Self {
            board: [None; BOARD_CELLS],
            current_turn: Role::X,
            last_starter: Role::X,
            scores: RoleScores::default(),
        }
    }

    /// 2 人目の参加でゲームを最初から始める（先手は X）
    pub(crate) fn start(&mut self) {
        self.board = [None; BOARD_CELLS];
        self.current_turn = Role::X;
        self.last_starter = Role::X;
        self.scores = RoleScores::default();
    }

    /// 再戦。先手を交代してから全リセットし、新しい先手を返す
    pub(crate) fn restart(&mut self) -> Role {
        self.last_starter = self.last_starter.opponent();
        self.board = [None; BOARD_CELLS];
        self.current_turn = self.last_starter;
        self.scores = RoleScores::default();
        self.last_starter
    }

    /// Apply one move for the given seat.
    ///
    /// The caller has already verified room status and that `role` really
    /// belongs to the acting connection; this method owns board legality,
    /// turn order, and round/game completion.
    pub fn apply_move(&mut self, cell: usize, role: Role) -> Result<TttMoveReport, GameError> {
        if cell >= BOARD_CELLS {
            return Err(GameError::InvalidMove);
        }
        if self.board[cell].is_some() {
            return Err(GameError::CellOccupied);
        }
        if role != self.current_turn {
            return Err(GameError::NotYourTurn);
        }

        self.board[cell] = Some(role);

        match self.round_result() {
            Some(RoundOutcome::Win(winner_role)) => {
                self.scores.add(winner_role);
                if self.scores.get(winner_role) >= ROUND_WINS_TO_FINISH {
                    // 最終盤面は見えるよう残したままゲームを終える
                    Ok(TttMoveReport {
                        cell,
                        role,
                        round_over: true,
                        round_winner: Some(Winner::from_role(winner_role)),
                        game_over: true,
                        game_winner: Some(winner_role),
                        scores: self.scores,
                        next_turn: None,
                    })
                } else {
                    // ラウンド終了、次ラウンドは先手交代
                    self.board = [None; BOARD_CELLS];
                    self.current_turn = self.last_starter.opponent();
                    self.last_starter = self.current_turn;
                    Ok(TttMoveReport {
                        cell,
                        role,
                        round_over: true,
                        round_winner: Some(Winner::from_role(winner_role)),
                        game_over: false,
                        game_winner: None,
                        scores: self.scores,
                        next_turn: Some(self.current_turn),
                    })
                }
            }
            Some(RoundOutcome::Draw) => {
                // 引き分けは盤だけリセットし、同じ先手で続ける
                self.board = [None; BOARD_CELLS];
                self.current_turn = self.last_starter;
                Ok(TttMoveReport {
                    cell,
                    role,
                    round_over: true,
                    round_winner: Some(Winner::Draw),
                    game_over: false,
                    game_winner: None,
                    scores: self.scores,
                    next_turn: Some(self.current_turn),
                })
            }
            None => {
                self.current_turn = self.current_turn.opponent();
                Ok(TttMoveReport {
                    cell,
                    role,
                    round_over: false,
                    round_winner: None,
                    game_over: false,
                    game_winner: None,
                    scores: self.scores,
                    next_turn: Some(self.current_turn),
                })
            }
        }
    }

    fn round_result(&self) -> Option<RoundOutcome> {
        for line in WIN_LINES {
            if let (Some(a), Some(b), Some(c)) = (
                self.board[line[0]],
                self.board[line[1]],
                self.board[line[2]],
            ) && a == b
                && b == c
            {
                return Some(RoundOutcome::Win(a));
            }
        }
        if self.board.iter().all(|cell| cell.is_some()) {
            return Some(RoundOutcome::Draw);
        }
        None
    }

    pub fn board(&self) -> &[Option<Role>; BOARD_CELLS] {
        &self.board
    }

    pub fn current_turn(&self) -> Role {
        self.current_turn
    }

    pub fn scores(&self) -> RoleScores {
        self.scores
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}
