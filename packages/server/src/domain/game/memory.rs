//! 神経衰弱エンジン
//!
//! 9 種類のシンボル × 2 枚 = 18 枚の山札を Fisher–Yates で偏りなく
//! シャッフルして配ります。2 枚めくって同じシンボルならマッチ、
//! 違えば手番が相手に移り、呼び出し側が一定時間後に 2 枚を裏に
//! 戻します（遅延はエンジンの内部タイマーではなくレジストリ側の
//! スケジューリング責務）。
//!
//! 盤はルーム作成と同時に配られるため、1 人だけの部屋でも裏向きの
//! グリッドを表示できます。

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::error::GameError;
use crate::domain::value_object::Role;

use super::{RoleScores, Winner};

/// 山札のシンボル（各 2 枚ずつ）
pub const SYMBOLS: [char; 9] = ['🍎', '🍌', '🍒', '🥝', '🍇', '🍋', '🍊', '🍑', '🥭'];

/// 山札の枚数
pub const DECK_SIZE: usize = SYMBOLS.len() * 2;

/// 盤上の 1 枚のカード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCard {
    pub id: usize,
    pub symbol: char,
    pub revealed: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryState {
    cards: Vec<MemoryCard>,
    turn: Role,
    flipped: Vec<usize>,
    matches: RoleScores,
}

/// 1 枚めくった結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipReport {
    /// ペアの 1 枚目を表にした
    Revealed { card: usize },
    /// 2 枚目が一致した。`game_over` は全ペア確定時の勝敗
    Matched {
        cards: [usize; 2],
        matches: RoleScores,
        game_over: Option<Winner>,
    },
    /// 2 枚目が不一致。カードは表のまま、手番が相手に移る。
    /// 呼び出し側は遅延後に `hide_cards` を実行すること
    Mismatch { cards: [usize; 2], next_turn: Role },
}

impl MemoryState {
    pub fn new() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    /// Deal a fresh shuffled board with the given RNG (tests pass a seeded
    /// one).
    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck: Vec<char> = SYMBOLS.iter().chain(SYMBOLS.iter()).copied().collect();
        deck.shuffle(rng);
        Self {
            cards: deck
                .into_iter()
                .enumerate()
                .map(|(id, symbol)| MemoryCard {
                    id,
                    symbol,
                    revealed: false,
                    matched: false,
                })
                .collect(),
            turn: Role::X,
            flipped: Vec::new(),
            matches: RoleScores::default(),
        }
    }

    /// ゲーム開始・再戦時の配り直し
    pub(crate) fn redeal(&mut self) {
        *self = Self::new();
    }

    /// Flip one card for the acting seat.
    ///
    /// Room status and player count are validated by the caller; this
    /// method owns turn order, the pending-pair limit, card availability,
    /// and match/finish bookkeeping.
    pub fn flip(&mut self, card_id: usize, role: Role) -> Result<FlipReport, GameError> {
        if role != self.turn {
            return Err(GameError::NotYourTurn);
        }
        if self.flipped.len() >= 2 {
            return Err(GameError::PairPending);
        }
        let card = self
            .cards
            .get(card_id)
            .ok_or(GameError::CardUnavailable)?;
        if card.revealed || card.matched {
            return Err(GameError::CardUnavailable);
        }

        self.cards[card_id].revealed = true;
        self.flipped.push(card_id);

        if self.flipped.len() < 2 {
            return Ok(FlipReport::Revealed { card: card_id });
        }

        let (first, second) = (self.flipped[0], self.flipped[1]);
        self.flipped.clear();

        if self.cards[first].symbol == self.cards[second].symbol {
            self.cards[first].matched = true;
            self.cards[second].matched = true;
            self.matches.add(role);

            let game_over = if self.matched_pairs() as usize == self.cards.len() / 2 {
                Some(self.final_result())
            } else {
                None
            };
            Ok(FlipReport::Matched {
                cards: [first, second],
                matches: self.matches,
                game_over,
            })
        } else {
            self.turn = self.turn.opponent();
            Ok(FlipReport::Mismatch {
                cards: [first, second],
                next_turn: self.turn,
            })
        }
    }

    /// 不一致だったペアを裏に戻す（マッチ済みのカードは触らない）
    ///
    /// タイマー経由で呼ばれるため、存在しない ID は黙って無視します。
    pub fn hide_cards(&mut self, ids: &[usize]) {
        for &id in ids {
            if let Some(card) = self.cards.get_mut(id)
                && !card.matched
            {
                card.revealed = false;
            }
        }
    }

    fn final_result(&self) -> Winner {
        match self.matches.x.cmp(&self.matches.o) {
            std::cmp::Ordering::Greater => Winner::X,
            std::cmp::Ordering::Less => Winner::O,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }

    pub fn cards(&self) -> &[MemoryCard] {
        &self.cards
    }

    pub fn turn(&self) -> Role {
        self.turn
    }

    pub fn matches(&self) -> RoleScores {
        self.matches
    }

    pub fn matched_pairs(&self) -> u32 {
        self.matches.total()
    }
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::new()
    }
}
