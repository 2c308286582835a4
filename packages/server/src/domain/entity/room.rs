//! ルームエンティティ
//!
//! 1 ゲームセッション分のメンバーシップ（プレイヤー最大 2 人 +
//! 観戦者任意数）とゲーム状態を所有し、ゲーム固有のロジックは
//! タグ付き共用体のエンジンに委譲します。
//!
//! ステータス遷移:
//! `waiting --(2人目の参加)--> in-progress --(エンジンの決着報告)-->
//! finished --(両プレイヤーの再戦投票)--> in-progress`

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::error::{GameError, RoomError};
use crate::domain::game::{
    FlipReport, GameState, MemoryCard, RoleScores, RpsChoice, RpsProgress, TttMoveReport, Winner,
};
use crate::domain::value_object::{ConnectionId, GameType, Role, RoomId, RoomName, Timestamp, Username};

/// ルーム内のプレイヤー（座席は参加順で X → O、再割り当てしない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub connection_id: ConnectionId,
    pub username: Username,
    pub role: Role,
}

/// 観戦者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spectator {
    pub connection_id: ConnectionId,
    pub username: Username,
}

/// ルームのステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Finished,
}

/// 接続をルームから外した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Player(Player),
    Spectator(Spectator),
    NotAMember,
}

/// 再戦投票の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartReport {
    /// 両者の投票が揃ってリセットが実行されたか
    pub restarted: bool,
    /// リセット後の先手（`restarted` のときのみ）
    pub first_turn: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub room_name: RoomName,
    game_type: GameType,
    players: Vec<Player>,
    spectators: Vec<Spectator>,
    game: GameState,
    status: RoomStatus,
    winner: Option<Winner>,
    restart_votes: HashSet<ConnectionId>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(
        room_id: RoomId,
        room_name: RoomName,
        game_type: GameType,
        created_at: Timestamp,
    ) -> Self {
        Self {
            room_id,
            room_name,
            game_type,
            players: Vec::new(),
            spectators: Vec::new(),
            // 神経衰弱は作成時点で配っておく（1 人でも盤を表示できる）
            game: GameState::new(game_type),
            status: RoomStatus::Waiting,
            winner: None,
            restart_votes: HashSet::new(),
            created_at,
        }
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn spectators(&self) -> &[Spectator] {
        &self.spectators
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, connection_id: &ConnectionId) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| &p.connection_id == connection_id)
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.player(connection_id).is_some()
            || self
                .spectators
                .iter()
                .any(|s| &s.connection_id == connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.spectators.is_empty()
    }

    /// 全メンバー（プレイヤー + 観戦者）の接続 ID
    pub fn member_connections(&self) -> Vec<ConnectionId> {
        self.players
            .iter()
            .map(|p| p.connection_id.clone())
            .chain(self.spectators.iter().map(|s| s.connection_id.clone()))
            .collect()
    }

    /// Add a player in join order. The second join starts the game.
    pub fn add_player(
        &mut self,
        connection_id: ConnectionId,
        username: Username,
    ) -> Result<Player, RoomError> {
        if self.players.len() >= 2 {
            return Err(RoomError::RoomFull);
        }
        if self.status == RoomStatus::InProgress {
            return Err(RoomError::GameAlreadyStarted);
        }

        let role = if self.players.is_empty() {
            Role::X
        } else {
            Role::O
        };
        let player = Player {
            connection_id,
            username,
            role,
        };
        self.players.push(player.clone());

        if self.players.len() == 2 {
            self.game.start();
            self.status = RoomStatus::InProgress;
            self.winner = None;
            self.restart_votes.clear();
        }

        Ok(player)
    }

    /// Spectators are never rejected.
    pub fn add_spectator(&mut self, connection_id: ConnectionId, username: Username) -> Spectator {
        let spectator = Spectator {
            connection_id,
            username,
        };
        self.spectators.push(spectator.clone());
        spectator
    }

    /// Remove a connection from whichever list holds it.
    ///
    /// If a player leaves mid-game and the registry did not take the
    /// forfeit path first, the room falls back to `waiting` with a full
    /// game reset. That branch is a defensive safety net; in normal
    /// operation the registry intercepts the two-player forfeit case.
    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> Removal {
        if let Some(index) = self
            .players
            .iter()
            .position(|p| &p.connection_id == connection_id)
        {
            let player = self.players.remove(index);
            self.restart_votes.remove(connection_id);
            if self.status == RoomStatus::InProgress {
                self.reset_game();
                self.status = RoomStatus::Waiting;
            }
            return Removal::Player(player);
        }

        if let Some(index) = self
            .spectators
            .iter()
            .position(|s| &s.connection_id == connection_id)
        {
            return Removal::Spectator(self.spectators.remove(index));
        }

        Removal::NotAMember
    }

    /// 三目並べの 1 手
    pub fn make_move(
        &mut self,
        connection_id: &ConnectionId,
        cell: usize,
        claimed_role: Role,
    ) -> Result<TttMoveReport, RoomError> {
        let GameState::TicTacToe(state) = &mut self.game else {
            return Err(RoomError::WrongGame(GameType::TicTacToe));
        };
        if self.status != RoomStatus::InProgress {
            return Err(GameError::NotInProgress.into());
        }
        let actor = self
            .players
            .iter()
            .find(|p| &p.connection_id == connection_id);
        match actor {
            Some(player) if player.role == claimed_role => {}
            _ => return Err(GameError::InvalidMove.into()),
        }

        let report = state.apply_move(cell, claimed_role)?;
        if report.game_over {
            self.status = RoomStatus::Finished;
            self.winner = report.game_winner.map(Winner::from_role);
        }
        Ok(report)
    }

    /// じゃんけんの手の提出
    pub fn submit_choice(
        &mut self,
        connection_id: &ConnectionId,
        choice: RpsChoice,
    ) -> Result<RpsProgress, RoomError> {
        let GameState::RockPaperScissors(state) = &mut self.game else {
            return Err(RoomError::WrongGame(GameType::RockPaperScissors));
        };
        if self.status == RoomStatus::Finished {
            return Err(GameError::AlreadyFinished.into());
        }
        let role = self
            .players
            .iter()
            .find(|p| &p.connection_id == connection_id)
            .map(|p| p.role)
            .ok_or(RoomError::NotAPlayer)?;

        let progress = state.submit(role, choice);
        if let RpsProgress::Resolved(report) = &progress
            && report.game_over
        {
            self.status = RoomStatus::Finished;
            self.winner = report.game_winner.map(Winner::from_role);
        }
        Ok(progress)
    }

    /// 神経衰弱のカードめくり
    pub fn flip_card(
        &mut self,
        connection_id: &ConnectionId,
        card_id: usize,
    ) -> Result<FlipReport, RoomError> {
        let status = self.status;
        let GameState::MemoryMatch(state) = &mut self.game else {
            return Err(RoomError::WrongGame(GameType::MemoryMatch));
        };
        let role = self
            .players
            .iter()
            .find(|p| &p.connection_id == connection_id)
            .map(|p| p.role)
            .ok_or(RoomError::NotAPlayer)?;
        if self.players.len() < 2 {
            return Err(GameError::WaitingForOpponent.into());
        }
        match status {
            RoomStatus::Waiting => return Err(GameError::NotStarted.into()),
            RoomStatus::Finished => return Err(GameError::Finished.into()),
            RoomStatus::InProgress => {}
        }

        let report = state.flip(card_id, role)?;
        if let FlipReport::Matched {
            game_over: Some(result),
            ..
        } = &report
        {
            self.status = RoomStatus::Finished;
            self.winner = Some(*result);
        }
        Ok(report)
    }

    /// 不一致ペアを裏に戻す（遅延タイマーから呼ばれる）
    pub fn hide_cards(&mut self, ids: &[usize]) {
        if let GameState::MemoryMatch(state) = &mut self.game {
            state.hide_cards(ids);
        }
    }

    /// Record a rematch vote. Resets the game once both current players
    /// have voted.
    pub fn request_restart(&mut self, connection_id: &ConnectionId) -> Result<RestartReport, RoomError> {
        if self.status != RoomStatus::Finished {
            return Err(RoomError::NotFinished);
        }
        if self.player(connection_id).is_none() {
            return Err(RoomError::NotAPlayer);
        }

        self.restart_votes.insert(connection_id.clone());
        let all_voted = self.players.len() == 2
            && self
                .players
                .iter()
                .all(|p| self.restart_votes.contains(&p.connection_id));
        if !all_voted {
            return Ok(RestartReport {
                restarted: false,
                first_turn: None,
            });
        }

        let first_turn = self.game.restart();
        self.restart_votes.clear();
        self.status = RoomStatus::InProgress;
        self.winner = None;
        Ok(RestartReport {
            restarted: true,
            first_turn: Some(first_turn),
        })
    }

    fn reset_game(&mut self) {
        self.game = GameState::new(self.game_type);
        self.winner = None;
        self.restart_votes.clear();
    }

    /// 勝者の表示名（勝者の座席 → ユーザー名、引き分け → "Draw"）
    pub fn winner_display(&self) -> Option<String> {
        let winner = self.winner?;
        match winner.role() {
            Some(role) => Some(
                self.players
                    .iter()
                    .find(|p| p.role == role)
                    .map(|p| p.username.to_string())
                    .unwrap_or_else(|| role.to_string()),
            ),
            None => Some("Draw".to_string()),
        }
    }

    /// ロビー向けの派生スナップショット（接続 ID は含めない）
    pub fn room_info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            room_name: self.room_name.to_string(),
            player_count: self.players.len(),
            spectator_count: self.spectators.len(),
            status: self.status,
            game_type: self.game_type,
            players: self.players.iter().map(PlayerView::from).collect(),
            spectators: self.spectators.iter().map(SpectatorView::from).collect(),
        }
    }

    /// ルーム内ブロードキャスト向けの派生スナップショット
    pub fn game_state_view(&self) -> GameStateView {
        let mut view = GameStateView {
            game_type: self.game_type,
            status: self.status,
            winner: self.winner,
            players: self.players.iter().map(PlayerView::from).collect(),
            board: None,
            current_turn: None,
            ttt_scores: None,
            rps_scores: None,
            rps_round: None,
            memory: None,
        };
        match &self.game {
            GameState::TicTacToe(state) => {
                view.board = Some(state.board().to_vec());
                view.current_turn = Some(state.current_turn());
                view.ttt_scores = Some(state.scores());
            }
            GameState::RockPaperScissors(state) => {
                view.rps_scores = Some(state.scores());
                view.rps_round = Some(state.round());
            }
            GameState::MemoryMatch(state) => {
                view.current_turn = Some(state.turn());
                view.memory = Some(MemoryView {
                    cards: state.cards().iter().map(MemoryCardView::from).collect(),
                    matches: state.matches(),
                    turn: state.turn(),
                });
            }
        }
        view
    }
}

/// クライアントに見せるプレイヤー情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub username: String,
    pub role: Role,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            username: player.username.to_string(),
            role: player.role,
        }
    }
}

/// クライアントに見せる観戦者情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectatorView {
    pub username: String,
}

impl From<&Spectator> for SpectatorView {
    fn from(spectator: &Spectator) -> Self {
        Self {
            username: spectator.username.to_string(),
        }
    }
}

/// ルーム一覧・ロビー向けのスナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub room_name: String,
    pub player_count: usize,
    pub spectator_count: usize,
    pub status: RoomStatus,
    pub game_type: GameType,
    pub players: Vec<PlayerView>,
    pub spectators: Vec<SpectatorView>,
}

/// 神経衰弱のカードのスナップショット
///
/// 裏向きのカードのシンボルは伏せて送る（盗み見対策）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCardView {
    pub id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<char>,
    pub revealed: bool,
    pub matched: bool,
}

impl From<&MemoryCard> for MemoryCardView {
    fn from(card: &MemoryCard) -> Self {
        Self {
            id: card.id,
            symbol: (card.revealed || card.matched).then_some(card.symbol),
            revealed: card.revealed,
            matched: card.matched,
        }
    }
}

/// 神経衰弱の盤面スナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryView {
    pub cards: Vec<MemoryCardView>,
    pub matches: RoleScores,
    pub turn: Role,
}

/// ルーム内ブロードキャスト向けのゲーム状態スナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateView {
    pub game_type: GameType,
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    pub players: Vec<PlayerView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Option<Role>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttt_scores: Option<RoleScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps_scores: Option<RoleScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps_round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(label: &str) -> ConnectionId {
        ConnectionId::new(format!("conn-{label}"))
    }

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn test_room(game_type: GameType) -> Room {
        Room::new(
            RoomId::new(111111),
            RoomName::default_for(RoomId::new(111111)),
            game_type,
            Timestamp::new(0),
        )
    }

    fn room_with_two_players(game_type: GameType) -> Room {
        let mut room = test_room(game_type);
        room.add_player(conn("a"), user("alice")).unwrap();
        room.add_player(conn("b"), user("bob")).unwrap();
        room
    }

    #[test]
    fn test_roles_assigned_in_join_order() {
        // テスト項目: 先着が X、後着が O になる
        // given (前提条件):
        let mut room = test_room(GameType::TicTacToe);

        // when (操作):
        let first = room.add_player(conn("a"), user("alice")).unwrap();
        let second = room.add_player(conn("b"), user("bob")).unwrap();

        // then (期待する結果):
        assert_eq!(first.role, Role::X);
        assert_eq!(second.role, Role::O);
        assert_eq!(room.status(), RoomStatus::InProgress);
    }

    #[test]
    fn test_third_player_rejected_room_full() {
        // テスト項目: 3 人目のプレイヤー参加は "Room is full" で失敗する
        // given (前提条件):
        let mut room = room_with_two_players(GameType::TicTacToe);

        // when (操作):
        let result = room.add_player(conn("c"), user("carol"));

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::RoomFull));
        assert_eq!(result.unwrap_err().to_string(), "Room is full");
    }

    #[test]
    fn test_spectator_join_always_succeeds() {
        // テスト項目: 観戦者の参加はプレイヤー数に関わらず成功する
        // given (前提条件):
        let mut room = room_with_two_players(GameType::TicTacToe);

        // when (操作):
        for i in 0..5 {
            room.add_spectator(conn(&format!("s{i}")), user(&format!("spec{i}")));
        }

        // then (期待する結果):
        assert_eq!(room.spectators().len(), 5);
    }

    #[test]
    fn test_move_requires_matching_role() {
        // テスト項目: 接続と座席が一致しない手は不正な手として拒否される
        // given (前提条件):
        let mut room = room_with_two_players(GameType::TicTacToe);

        // when (操作): alice (X) が O を騙って打つ
        let result = room.make_move(&conn("a"), 0, Role::O);

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::Game(GameError::InvalidMove)));
    }

    #[test]
    fn test_move_rejected_before_game_starts() {
        // テスト項目: 対戦相手が来る前の着手は拒否される
        // given (前提条件):
        let mut room = test_room(GameType::TicTacToe);
        room.add_player(conn("a"), user("alice")).unwrap();

        // when (操作):
        let result = room.make_move(&conn("a"), 0, Role::X);

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::Game(GameError::NotInProgress)));
    }

    #[test]
    fn test_wrong_game_type_rejected() {
        // テスト項目: ゲーム種別が違う操作は拒否される
        // given (前提条件):
        let mut room = room_with_two_players(GameType::RockPaperScissors);

        // when (操作):
        let result = room.make_move(&conn("a"), 0, Role::X);

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::WrongGame(GameType::TicTacToe)));
    }

    #[test]
    fn test_rps_submission_from_non_member_rejected() {
        // テスト項目: ルーム外の接続からの手の提出はエラーになる
        // given (前提条件):
        let mut room = room_with_two_players(GameType::RockPaperScissors);

        // when (操作):
        let result = room.submit_choice(&conn("z"), RpsChoice::Rock);

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::NotAPlayer));
    }

    #[test]
    fn test_memory_flip_waits_for_second_player() {
        // テスト項目: 1 人だけの部屋でのめくりは相手待ちで拒否される
        // given (前提条件):
        let mut room = test_room(GameType::MemoryMatch);
        room.add_player(conn("a"), user("alice")).unwrap();

        // when (操作):
        let result = room.flip_card(&conn("a"), 0);

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::Game(GameError::WaitingForOpponent)));
    }

    #[test]
    fn test_restart_needs_both_player_votes() {
        // テスト項目: 再戦は両プレイヤーの投票が揃うまで実行されない
        // given (前提条件): X が 3 ラウンド取って決着済み
        let mut room = room_with_two_players(GameType::TicTacToe);
        finish_ttt_with_x_winning(&mut room);
        assert_eq!(room.status(), RoomStatus::Finished);

        // when (操作): alice だけが投票
        let first_vote = room.request_restart(&conn("a")).unwrap();

        // then (期待する結果): まだ finished のまま
        assert!(!first_vote.restarted);
        assert_eq!(room.status(), RoomStatus::Finished);

        // when (操作): bob も投票
        let second_vote = room.request_restart(&conn("b")).unwrap();

        // then (期待する結果): リセットされ、先手が交代している
        assert!(second_vote.restarted);
        assert_eq!(second_vote.first_turn, Some(Role::O));
        assert_eq!(room.status(), RoomStatus::InProgress);
        assert_eq!(room.winner(), None);
    }

    #[test]
    fn test_restart_rejected_while_in_progress() {
        // テスト項目: 決着前の再戦要求は拒否される
        // given (前提条件):
        let mut room = room_with_two_players(GameType::TicTacToe);

        // when (操作):
        let result = room.request_restart(&conn("a"));

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::NotFinished));
    }

    #[test]
    fn test_defensive_reset_when_player_removed_mid_game() {
        // テスト項目: (防御的分岐) 進行中にプレイヤーが外れたら waiting に
        //             戻り、ゲーム状態が全リセットされる。通常運用では
        //             レジストリの強制敗北処理が先に走るため、この分岐は
        //             安全網として残している
        // given (前提条件):
        let mut room = room_with_two_players(GameType::TicTacToe);
        room.make_move(&conn("a"), 4, Role::X).unwrap();

        // when (操作):
        let removal = room.remove_connection(&conn("b"));

        // then (期待する結果):
        assert!(matches!(removal, Removal::Player(_)));
        assert_eq!(room.status(), RoomStatus::Waiting);
        let view = room.game_state_view();
        assert!(view.board.unwrap().iter().all(|cell| cell.is_none()));
    }

    #[test]
    fn test_is_empty_after_last_member_leaves() {
        // テスト項目: 最後のメンバーが抜けたら is_empty が真になる
        // given (前提条件):
        let mut room = test_room(GameType::TicTacToe);
        room.add_player(conn("a"), user("alice")).unwrap();
        room.add_spectator(conn("s"), user("sam"));

        // when (操作):
        room.remove_connection(&conn("a"));
        assert!(!room.is_empty());
        room.remove_connection(&conn("s"));

        // then (期待する結果):
        assert!(room.is_empty());
    }

    #[test]
    fn test_snapshots_do_not_leak_connection_ids() {
        // テスト項目: 派生スナップショットに接続 ID が含まれない
        // given (前提条件):
        let mut room = room_with_two_players(GameType::TicTacToe);
        room.add_spectator(conn("s"), user("sam"));

        // when (操作):
        let info_json = serde_json::to_string(&room.room_info()).unwrap();
        let state_json = serde_json::to_string(&room.game_state_view()).unwrap();

        // then (期待する結果):
        for json in [info_json, state_json] {
            assert!(!json.contains("conn-"), "leaked connection id: {json}");
        }
    }

    #[test]
    fn test_memory_view_masks_face_down_symbols() {
        // テスト項目: 裏向きのカードのシンボルはスナップショットに載らない
        // given (前提条件):
        let room = room_with_two_players(GameType::MemoryMatch);

        // when (操作):
        let view = room.game_state_view();

        // then (期待する結果):
        let memory = view.memory.unwrap();
        assert!(memory.cards.iter().all(|card| card.symbol.is_none()));
    }

    /// X が 3 ラウンド連取して決着させる
    fn finish_ttt_with_x_winning(room: &mut Room) {
        let a = conn("a");
        let b = conn("b");
        // ラウンド 1（X 先手）
        for (cell, role) in [(4, Role::X), (0, Role::O), (1, Role::X), (2, Role::O), (7, Role::X)] {
            let c = if role == Role::X { &a } else { &b };
            room.make_move(c, cell, role).unwrap();
        }
        // ラウンド 2（O 先手）
        for (cell, role) in [
            (8, Role::O),
            (0, Role::X),
            (7, Role::O),
            (1, Role::X),
            (5, Role::O),
            (2, Role::X),
        ] {
            let c = if role == Role::X { &a } else { &b };
            room.make_move(c, cell, role).unwrap();
        }
        // ラウンド 3（X 先手）
        for (cell, role) in [(0, Role::X), (3, Role::O), (1, Role::X), (4, Role::O), (2, Role::X)] {
            let c = if role == Role::X { &a } else { &b };
            room.make_move(c, cell, role).unwrap();
        }
    }
}
