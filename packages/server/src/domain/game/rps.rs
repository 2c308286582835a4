//! じゃんけんエンジン
//!
//! 両者が隠して出した手が揃った時点でラウンドが解決されます。
//! 先に 5 ラウンド取った座席がゲームの勝者です。解決後の手は次の
//! ラウンドに向けてクリアされますが、最終ラウンドの結果にはそのまま
//! 残します（クライアントが決着時の手を表示できるように）。

use serde::{Deserialize, Serialize};

use crate::domain::value_object::Role;

use super::{RoleScores, Winner};

/// ゲーム終了に必要なラウンド勝利数
pub const ROUND_WINS_TO_FINISH: u32 = 5;

/// じゃんけんの手
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    /// Standard beats-table: rock > scissors, scissors > paper, paper > rock.
    pub fn beats(&self, other: RpsChoice) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors)
                | (Self::Scissors, Self::Paper)
                | (Self::Paper, Self::Rock)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpsState {
    choice_x: Option<RpsChoice>,
    choice_o: Option<RpsChoice>,
    round: u32,
    scores: RoleScores,
}

/// 手を提出した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpsProgress {
    /// 相手の手がまだ出ていない
    Waiting,
    /// ラウンドが解決された
    Resolved(RpsRoundReport),
}

/// 解決されたラウンドの内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpsRoundReport {
    pub choice_x: RpsChoice,
    pub choice_o: RpsChoice,
    pub winner: Winner,
    pub round: u32,
    pub scores: RoleScores,
    pub game_over: bool,
    pub game_winner: Option<Role>,
}

impl RpsState {
    pub fn new() -> Self {
        Self {
            choice_x: None,
            choice_o: None,
            round: 1,
            scores: RoleScores::default(),
        }
    }

    /// ゲーム全体のリセット（開始・再戦時）
    pub(crate) fn reset(&mut self) {
        self.choice_x = None;
        self.choice_o = None;
        self.round = 1;
        self.scores = RoleScores::default();
    }

    /// Submit a hidden choice for the given seat.
    ///
    /// Overwrites an earlier submission for the same seat within the round.
    /// The round resolves only once both choices are present; the caller
    /// has already rejected finished games and non-members.
    pub fn submit(&mut self, role: Role, choice: RpsChoice) -> RpsProgress {
        match role {
            Role::X => self.choice_x = Some(choice),
            Role::O => self.choice_o = Some(choice),
        }

        let (Some(choice_x), Some(choice_o)) = (self.choice_x, self.choice_o) else {
            return RpsProgress::Waiting;
        };

        let winner = Self::evaluate(choice_x, choice_o);
        if let Some(winner_role) = winner.role() {
            self.scores.add(winner_role);
        }

        let round = self.round;
        self.round += 1;

        let game_winner = [Role::X, Role::O]
            .into_iter()
            .find(|&r| self.scores.get(r) >= ROUND_WINS_TO_FINISH);
        let game_over = game_winner.is_some();

        // 決着ラウンドの手は残し、続くラウンドに向けてだけクリアする
        if !game_over {
            self.choice_x = None;
            self.choice_o = None;
        }

        RpsProgress::Resolved(RpsRoundReport {
            choice_x,
            choice_o,
            winner,
            round,
            scores: self.scores,
            game_over,
            game_winner,
        })
    }

    fn evaluate(choice_x: RpsChoice, choice_o: RpsChoice) -> Winner {
        if choice_x == choice_o {
            Winner::Draw
        } else if choice_x.beats(choice_o) {
            Winner::X
        } else {
            Winner::O
        }
    }

    pub fn scores(&self) -> RoleScores {
        self.scores
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn choices(&self) -> (Option<RpsChoice>, Option<RpsChoice>) {
        (self.choice_x, self.choice_o)
    }
}

impl Default for RpsState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(progress: RpsProgress) -> RpsRoundReport {
        match progress {
            RpsProgress::Resolved(report) => report,
            RpsProgress::Waiting => panic!("expected a resolved round"),
        }
    }

    #[test]
    fn test_first_submission_waits_for_opponent() {
        // テスト項目: 片方だけの提出では解決されない
        // given (前提条件):
        let mut state = RpsState::new();

        // when (操作):
        let progress = state.submit(Role::X, RpsChoice::Rock);

        // then (期待する結果):
        assert_eq!(progress, RpsProgress::Waiting);
    }

    #[test]
    fn test_equal_choices_draw() {
        // テスト項目: 同じ手同士は引き分けになりスコアは動かない
        // given (前提条件):
        let mut state = RpsState::new();
        state.submit(Role::X, RpsChoice::Rock);

        // when (操作):
        let report = resolved(state.submit(Role::O, RpsChoice::Rock));

        // then (期待する結果):
        assert_eq!(report.winner, Winner::Draw);
        assert_eq!(report.scores, RoleScores::default());
    }

    #[test]
    fn test_beats_table_is_deterministic() {
        // テスト項目: 固定の三すくみ表どおりに勝者が決まる
        let cases = [
            (RpsChoice::Rock, RpsChoice::Scissors, Winner::X),
            (RpsChoice::Scissors, RpsChoice::Rock, Winner::O),
            (RpsChoice::Scissors, RpsChoice::Paper, Winner::X),
            (RpsChoice::Paper, RpsChoice::Scissors, Winner::O),
            (RpsChoice::Paper, RpsChoice::Rock, Winner::X),
            (RpsChoice::Rock, RpsChoice::Paper, Winner::O),
        ];
        for (x, o, expected) in cases {
            // given (前提条件):
            let mut state = RpsState::new();

            // when (操作):
            state.submit(Role::X, x);
            let report = resolved(state.submit(Role::O, o));

            // then (期待する結果):
            assert_eq!(report.winner, expected, "{x:?} vs {o:?}");
        }
    }

    #[test]
    fn test_choices_clear_after_non_final_round() {
        // テスト項目: 決着でないラウンドの後は手がクリアされる
        // given (前提条件):
        let mut state = RpsState::new();
        state.submit(Role::X, RpsChoice::Rock);
        state.submit(Role::O, RpsChoice::Scissors);

        // when (操作) / then (期待する結果):
        assert_eq!(state.choices(), (None, None));
        assert_eq!(state.round(), 2);
    }

    #[test]
    fn test_four_wins_do_not_finish_five_do() {
        // テスト項目: 4 勝では終わらず、5 勝でゲームが終わる
        // given (前提条件):
        let mut state = RpsState::new();

        // when (操作): X が 4 ラウンド連取する
        for _ in 0..4 {
            state.submit(Role::X, RpsChoice::Rock);
            let report = resolved(state.submit(Role::O, RpsChoice::Scissors));
            assert!(!report.game_over);
        }

        // 5 ラウンド目
        state.submit(Role::X, RpsChoice::Paper);
        let report = resolved(state.submit(Role::O, RpsChoice::Rock));

        // then (期待する結果):
        assert!(report.game_over);
        assert_eq!(report.game_winner, Some(Role::X));
        assert_eq!(report.scores.get(Role::X), ROUND_WINS_TO_FINISH);
    }

    #[test]
    fn test_final_round_choices_remain_visible() {
        // テスト項目: 決着ラウンドの手は状態に残る
        // given (前提条件):
        let mut state = RpsState::new();
        for _ in 0..4 {
            state.submit(Role::X, RpsChoice::Rock);
            state.submit(Role::O, RpsChoice::Scissors);
        }

        // when (操作):
        state.submit(Role::X, RpsChoice::Rock);
        let report = resolved(state.submit(Role::O, RpsChoice::Scissors));

        // then (期待する結果):
        assert!(report.game_over);
        assert_eq!(
            state.choices(),
            (Some(RpsChoice::Rock), Some(RpsChoice::Scissors))
        );
    }

    #[test]
    fn test_resubmission_overwrites_within_round() {
        // テスト項目: 同一ラウンド内の再提出は前の手を上書きする
        // given (前提条件):
        let mut state = RpsState::new();
        state.submit(Role::X, RpsChoice::Rock);

        // when (操作): X が出し直してから O が出す
        state.submit(Role::X, RpsChoice::Paper);
        let report = resolved(state.submit(Role::O, RpsChoice::Rock));

        // then (期待する結果):
        assert_eq!(report.choice_x, RpsChoice::Paper);
        assert_eq!(report.winner, Winner::X);
    }
}
