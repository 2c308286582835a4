//! ゲームハブ（セッションレジストリ）
//!
//! プロセス全体で 1 つだけ存在する集約。ルーム表、接続⇔ルームの対応、
//! オンラインユーザー表、ロビーチャット履歴、保留中の招待を所有します。
//!
//! すべての変更はこの集約のメソッド経由でのみ行い、トランスポート層が
//! 直接フィールドを触ることはありません。呼び出し側（リポジトリ実装）が
//! 単一のロックで直列化するため、メソッド内の check-then-act は
//! 割り込まれない前提で書いています。

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use serde::Serialize;

use crate::domain::entity::room::{
    GameStateView, PlayerView, Removal, Room, RoomInfo, RoomStatus,
};
use crate::domain::error::HubError;
use crate::domain::game::{FlipReport, RpsChoice, RpsProgress, RpsRoundReport, TttMoveReport, Winner};
use crate::domain::value_object::{ConnectionId, GameType, Role, RoomId, RoomName, Timestamp, Username};

/// ロビーチャット履歴の上限（リングバッファ）
pub const LOBBY_MESSAGE_CAP: usize = 120;

/// ロビーチャットの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyMessage {
    pub username: String,
    pub message: String,
    pub timestamp: Timestamp,
}

/// 保留中の招待（受信者ごとに最大 1 件、上書きされる）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invitation {
    pub from: Username,
    pub game_type: GameType,
}

/// ロビーの状態（公開中のルーム + オンラインユーザー）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyState {
    pub rooms: Vec<RoomInfo>,
    pub users: Vec<String>,
}

/// ルーム作成の結果
#[derive(Debug, Clone)]
pub struct RoomCreated {
    pub room_id: RoomId,
    pub room_name: String,
    pub game_type: GameType,
    pub player: PlayerView,
    pub game_state: GameStateView,
}

/// ルーム参加の結果
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Player {
        room_id: RoomId,
        room_name: String,
        game_type: GameType,
        player: PlayerView,
        players: Vec<PlayerView>,
        /// 2 人目の参加でゲームが始まった場合の先手
        started: Option<Role>,
        targets: Vec<ConnectionId>,
        game_state: GameStateView,
    },
    Spectator {
        room_info: RoomInfo,
        game_type: GameType,
        targets: Vec<ConnectionId>,
        game_state: GameStateView,
    },
}

/// 決着したゲームの記録材料（統計ゲートウェイに 1 回だけ渡す）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    pub winner: Winner,
    pub players: Vec<PlayerView>,
    pub game_type: GameType,
}

/// 三目並べの 1 手が適用された結果
#[derive(Debug, Clone)]
pub struct MoveApplied {
    pub room_id: RoomId,
    pub report: TttMoveReport,
    pub game_state: GameStateView,
    pub targets: Vec<ConnectionId>,
    pub finished: Option<FinishedGame>,
}

/// じゃんけんの手の提出結果
#[derive(Debug, Clone)]
pub enum ChoiceOutcome {
    /// 相手待ち（提出者にだけ知らせる）
    Waiting,
    Resolved {
        room_id: RoomId,
        report: RpsRoundReport,
        /// ラウンド勝者のユーザー名（引き分けは None）
        winner_username: Option<String>,
        /// ゲーム勝者のユーザー名（決着時のみ）
        game_winner_username: Option<String>,
        game_state: GameStateView,
        targets: Vec<ConnectionId>,
        finished: Option<FinishedGame>,
    },
}

/// 神経衰弱のめくりが適用された結果
#[derive(Debug, Clone)]
pub struct FlipApplied {
    pub room_id: RoomId,
    pub report: FlipReport,
    pub game_state: GameStateView,
    pub targets: Vec<ConnectionId>,
    pub finished: Option<FinishedGame>,
    /// 不一致ペア。呼び出し側が遅延後に `hide_cards` を実行する
    pub pending_hide: Option<[usize; 2]>,
}

/// 再戦投票の結果
#[derive(Debug, Clone)]
pub struct RestartOutcome {
    pub room_id: RoomId,
    pub restarted: bool,
    pub first_turn: Option<Role>,
    pub players: Vec<PlayerView>,
    pub game_type: GameType,
    pub game_state: GameStateView,
    pub targets: Vec<ConnectionId>,
}

/// 退室・切断の結果
#[derive(Debug, Clone)]
pub enum Departure {
    /// どのルームにもいなかった
    NotInRoom,
    /// 通常の退室
    Left {
        room_id: RoomId,
        room_deleted: bool,
        targets: Vec<ConnectionId>,
        game_state: Option<GameStateView>,
    },
    /// 進行中の 2 人対戦からの離脱 = 強制敗北。残ったプレイヤーが勝者
    /// となり、ルームは観戦者が残っていても即座に削除される
    Forfeit {
        room_id: RoomId,
        game_type: GameType,
        winner: PlayerView,
        leaver_username: String,
        /// 記録用（離脱者を含む両プレイヤー）
        players: Vec<PlayerView>,
        /// 退去通知を送る接続（残ったプレイヤー + 全観戦者）
        evicted: Vec<ConnectionId>,
    },
}

/// 招待送信の結果
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationSent {
    pub recipient_connection: ConnectionId,
    pub from: Username,
    pub game_type: GameType,
}

/// 招待承諾の結果
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationAccepted {
    pub room_id: RoomId,
    pub room_name: String,
    pub game_type: GameType,
    pub sender_connection: ConnectionId,
    pub sender_player: PlayerView,
    pub acceptor_player: PlayerView,
    pub players: Vec<PlayerView>,
    pub first_turn: Role,
    pub game_state: GameStateView,
    pub targets: Vec<ConnectionId>,
}

/// 招待辞退の結果
#[derive(Debug, Clone)]
pub struct InvitationDeclined {
    /// まだオンラインなら送信者に知らせる
    pub sender_connection: Option<ConnectionId>,
    pub to: Username,
}

/// 観戦者退去の結果
#[derive(Debug, Clone)]
pub struct EvictionReport {
    pub room_id: RoomId,
    pub evicted: Vec<ConnectionId>,
    pub winner: String,
    pub room_deleted: bool,
}

/// ルーム内ブロードキャストのための状態再取得
#[derive(Debug, Clone)]
pub struct StateRefresh {
    pub game_state: GameStateView,
    pub targets: Vec<ConnectionId>,
}

/// ルームチャットの配信内容
#[derive(Debug, Clone)]
pub struct RoomChat {
    pub room_id: RoomId,
    pub username: String,
    pub message: String,
    pub timestamp: Timestamp,
    pub targets: Vec<ConnectionId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GameHub {
    rooms: HashMap<RoomId, Room>,
    connection_to_room: HashMap<ConnectionId, RoomId>,
    online_users: HashMap<ConnectionId, Username>,
    lobby_messages: VecDeque<LobbyMessage>,
    pending_invitations: HashMap<Username, Invitation>,
}

impl GameHub {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------
    // 接続ライフサイクル
    // ------------------------------------------------------------

    /// 接続をオンラインユーザーとして登録し、ロビーチャット履歴を返す
    pub fn register_user(
        &mut self,
        connection_id: ConnectionId,
        username: Username,
    ) -> Vec<LobbyMessage> {
        self.online_users.insert(connection_id, username);
        self.lobby_messages.iter().cloned().collect()
    }

    /// 切断処理。ルームからの離脱（必要なら強制敗北）とオンライン表の
    /// 掃除をまとめて行う
    pub fn handle_disconnect(&mut self, connection_id: &ConnectionId) -> Departure {
        let departure = match self.connection_to_room.get(connection_id).copied() {
            Some(room_id) => self.depart(connection_id, room_id),
            None => Departure::NotInRoom,
        };
        self.online_users.remove(connection_id);
        departure
    }

    /// 明示的な退室
    pub fn leave_room(
        &mut self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<Departure, HubError> {
        if !self.rooms.contains_key(&room_id) {
            return Err(HubError::RoomNotFound);
        }
        Ok(self.depart(connection_id, room_id))
    }

    fn depart(&mut self, connection_id: &ConnectionId, room_id: RoomId) -> Departure {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            self.connection_to_room.remove(connection_id);
            return Departure::NotInRoom;
        };

        let was_in_progress = room.status() == RoomStatus::InProgress;
        let had_two_players = room.player_count() == 2;
        let leaver = room.player(connection_id).cloned();

        if was_in_progress && had_two_players && let Some(leaver) = leaver {
            // 強制敗北: ゲームは 1 人では続けられないので、観戦者が
            // 残っていてもルームごと畳む
            let game_type = room.game_type();
            let players: Vec<PlayerView> = room.players().iter().map(PlayerView::from).collect();
            let winner_player = room
                .players()
                .iter()
                .find(|p| p.connection_id != leaver.connection_id)
                .cloned();
            let Some(winner_player) = winner_player else {
                // 相手が見つからないのは不整合だが、掃除だけして続行する
                room.remove_connection(connection_id);
                self.connection_to_room.remove(connection_id);
                return Departure::NotInRoom;
            };
            let evicted: Vec<ConnectionId> = room
                .member_connections()
                .into_iter()
                .filter(|c| c != connection_id)
                .collect();

            for connection in &evicted {
                self.connection_to_room.remove(connection);
            }
            self.connection_to_room.remove(connection_id);
            self.rooms.remove(&room_id);

            return Departure::Forfeit {
                room_id,
                game_type,
                winner: PlayerView::from(&winner_player),
                leaver_username: leaver.username.to_string(),
                players,
                evicted,
            };
        }

        let removal = room.remove_connection(connection_id);
        self.connection_to_room.remove(connection_id);

        match removal {
            Removal::NotAMember => Departure::NotInRoom,
            Removal::Player(_) | Removal::Spectator(_) => {
                if room.is_empty() {
                    // 空のルームは残さない
                    self.rooms.remove(&room_id);
                    Departure::Left {
                        room_id,
                        room_deleted: true,
                        targets: Vec::new(),
                        game_state: None,
                    }
                } else {
                    Departure::Left {
                        room_id,
                        room_deleted: false,
                        targets: room.member_connections(),
                        game_state: Some(room.game_state_view()),
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------
    // ロビー
    // ------------------------------------------------------------

    /// 公開中のルーム一覧（決着済みのルームは一覧に出さない）
    pub fn rooms_list(&self) -> Vec<RoomInfo> {
        self.rooms
            .values()
            .map(Room::room_info)
            .filter(|info| info.status != RoomStatus::Finished)
            .collect()
    }

    pub fn lobby_state(&self) -> LobbyState {
        LobbyState {
            rooms: self.rooms_list(),
            users: self
                .online_users
                .values()
                .map(|u| u.to_string())
                .collect(),
        }
    }

    /// 全オンライン接続（ロビーブロードキャストの宛先）
    pub fn all_connections(&self) -> Vec<ConnectionId> {
        self.online_users.keys().cloned().collect()
    }

    pub fn username_of(&self, connection_id: &ConnectionId) -> Option<&Username> {
        self.online_users.get(connection_id)
    }

    /// ロビーチャットに 1 件追加し、配信内容と宛先を返す
    pub fn push_lobby_message(
        &mut self,
        connection_id: &ConnectionId,
        message: &str,
        timestamp: Timestamp,
    ) -> Result<(LobbyMessage, Vec<ConnectionId>), HubError> {
        let username = self
            .online_users
            .get(connection_id)
            .ok_or(HubError::UnknownConnection)?;
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(HubError::EmptyMessage);
        }

        let entry = LobbyMessage {
            username: username.to_string(),
            message: trimmed.to_string(),
            timestamp,
        };
        self.lobby_messages.push_back(entry.clone());
        while self.lobby_messages.len() > LOBBY_MESSAGE_CAP {
            self.lobby_messages.pop_front();
        }
        Ok((entry, self.all_connections()))
    }

    /// ルームチャットの配信内容を作る（履歴は持たない）
    pub fn room_chat(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        message: &str,
        timestamp: Timestamp,
    ) -> Result<RoomChat, HubError> {
        let username = self
            .online_users
            .get(connection_id)
            .ok_or(HubError::UnknownConnection)?;
        let room = self.rooms.get(&room_id).ok_or(HubError::RoomNotFound)?;
        if !room.is_member(connection_id) {
            return Err(HubError::NotInRoom);
        }
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(HubError::EmptyMessage);
        }
        Ok(RoomChat {
            room_id,
            username: username.to_string(),
            message: trimmed.to_string(),
            timestamp,
            targets: room.member_connections(),
        })
    }

    // ------------------------------------------------------------
    // ルーム作成・参加
    // ------------------------------------------------------------

    /// Create a room with the requester as the sole first player.
    pub fn create_room(
        &mut self,
        connection_id: &ConnectionId,
        room_name: Option<RoomName>,
        game_type: GameType,
        now: Timestamp,
    ) -> Result<RoomCreated, HubError> {
        let username = self
            .online_users
            .get(connection_id)
            .ok_or(HubError::UnknownConnection)?
            .clone();
        if self.connection_to_room.contains_key(connection_id) {
            return Err(HubError::AlreadyInGame);
        }

        let room_id = self.generate_room_id(&mut rand::thread_rng());
        let room_name = room_name.unwrap_or_else(|| RoomName::default_for(room_id));
        let mut room = Room::new(room_id, room_name, game_type, now);
        let player = room.add_player(connection_id.clone(), username)?;

        let created = RoomCreated {
            room_id,
            room_name: room.room_name.to_string(),
            game_type,
            player: PlayerView::from(&player),
            game_state: room.game_state_view(),
        };
        self.rooms.insert(room_id, room);
        self.connection_to_room
            .insert(connection_id.clone(), room_id);
        Ok(created)
    }

    /// 未使用の 6 桁ルーム ID を引く。単一ロック下で呼ばれる前提なので
    /// check-then-act の再抽選で十分（衝突時はやり直すだけ）
    fn generate_room_id<R: Rng + ?Sized>(&self, rng: &mut R) -> RoomId {
        loop {
            let candidate = RoomId::new(rng.gen_range(100_000..1_000_000));
            if !self.rooms.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Join a room as a player or spectator.
    ///
    /// All validation happens before any state is committed so a rejection
    /// never leaves a half-joined connection behind.
    pub fn join_room(
        &mut self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        as_spectator: bool,
    ) -> Result<JoinOutcome, HubError> {
        let username = self
            .online_users
            .get(connection_id)
            .ok_or(HubError::UnknownConnection)?
            .clone();
        let room = self.rooms.get(&room_id).ok_or(HubError::RoomNotFound)?;

        if room.status() == RoomStatus::Finished {
            return Err(HubError::RoomClosed);
        }
        if room.is_member(connection_id) {
            return Err(HubError::AlreadyInRoom);
        }
        if !as_spectator {
            if room.player_count() >= 2 {
                return Err(crate::domain::error::RoomError::RoomFull.into());
            }
            if room.status() == RoomStatus::InProgress {
                return Err(crate::domain::error::RoomError::GameAlreadyStarted.into());
            }
        }

        // 検証が済んでから状態を変更する。対応表はメンバー追加が
        // 成立してから張る（拒否時に中途半端な参加を残さない）
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(HubError::RoomNotFound)?;

        if as_spectator {
            room.add_spectator(connection_id.clone(), username);
            self.connection_to_room
                .insert(connection_id.clone(), room_id);
            Ok(JoinOutcome::Spectator {
                room_info: room.room_info(),
                game_type: room.game_type(),
                targets: room.member_connections(),
                game_state: room.game_state_view(),
            })
        } else {
            let player = room.add_player(connection_id.clone(), username)?;
            self.connection_to_room
                .insert(connection_id.clone(), room_id);
            let started = (room.player_count() == 2).then_some(Role::X);
            Ok(JoinOutcome::Player {
                room_id,
                room_name: room.room_name.to_string(),
                game_type: room.game_type(),
                player: PlayerView::from(&player),
                players: room.players().iter().map(PlayerView::from).collect(),
                started,
                targets: room.member_connections(),
                game_state: room.game_state_view(),
            })
        }
    }

    // ------------------------------------------------------------
    // ゲーム操作
    // ------------------------------------------------------------

    pub fn make_move(
        &mut self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        cell: usize,
        claimed_role: Role,
    ) -> Result<MoveApplied, HubError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(HubError::RoomNotFound)?;
        let report = room.make_move(connection_id, cell, claimed_role)?;
        let finished = report.game_winner.map(|winner_role| FinishedGame {
            winner: Winner::from_role(winner_role),
            players: room.players().iter().map(PlayerView::from).collect(),
            game_type: room.game_type(),
        });
        Ok(MoveApplied {
            room_id,
            report,
            game_state: room.game_state_view(),
            targets: room.member_connections(),
            finished,
        })
    }

    pub fn submit_choice(
        &mut self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        choice: RpsChoice,
    ) -> Result<ChoiceOutcome, HubError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(HubError::RoomNotFound)?;
        match room.submit_choice(connection_id, choice)? {
            RpsProgress::Waiting => Ok(ChoiceOutcome::Waiting),
            RpsProgress::Resolved(report) => {
                let username_of_role = |role: Role| {
                    room.players()
                        .iter()
                        .find(|p| p.role == role)
                        .map(|p| p.username.to_string())
                };
                let winner_username = report.winner.role().and_then(username_of_role);
                let game_winner_username = report.game_winner.and_then(username_of_role);
                let finished = report.game_winner.map(|winner_role| FinishedGame {
                    winner: Winner::from_role(winner_role),
                    players: room.players().iter().map(PlayerView::from).collect(),
                    game_type: room.game_type(),
                });
                Ok(ChoiceOutcome::Resolved {
                    room_id,
                    report,
                    winner_username,
                    game_winner_username,
                    game_state: room.game_state_view(),
                    targets: room.member_connections(),
                    finished,
                })
            }
        }
    }

    pub fn flip_card(
        &mut self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        card_id: usize,
    ) -> Result<FlipApplied, HubError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(HubError::RoomNotFound)?;
        let report = room.flip_card(connection_id, card_id)?;

        let (finished, pending_hide) = match &report {
            FlipReport::Matched {
                game_over: Some(result),
                ..
            } => (
                Some(FinishedGame {
                    winner: *result,
                    players: room.players().iter().map(PlayerView::from).collect(),
                    game_type: room.game_type(),
                }),
                None,
            ),
            FlipReport::Mismatch { cards, .. } => (None, Some(*cards)),
            _ => (None, None),
        };

        Ok(FlipApplied {
            room_id,
            report,
            game_state: room.game_state_view(),
            targets: room.member_connections(),
            finished,
            pending_hide,
        })
    }

    /// 不一致ペアを裏に戻す（遅延タイマーから呼ばれる）
    ///
    /// タイマー発火時点でルームが消えていることがあるため、存在しなければ
    /// 何もせず `None` を返す
    pub fn hide_cards(&mut self, room_id: RoomId, ids: &[usize]) -> Option<StateRefresh> {
        let room = self.rooms.get_mut(&room_id)?;
        room.hide_cards(ids);
        Some(StateRefresh {
            game_state: room.game_state_view(),
            targets: room.member_connections(),
        })
    }

    pub fn request_restart(
        &mut self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<RestartOutcome, HubError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(HubError::RoomNotFound)?;
        let report = room.request_restart(connection_id)?;
        Ok(RestartOutcome {
            room_id,
            restarted: report.restarted,
            first_turn: report.first_turn,
            players: room.players().iter().map(PlayerView::from).collect(),
            game_type: room.game_type(),
            game_state: room.game_state_view(),
            targets: room.member_connections(),
        })
    }

    /// 決着後の猶予期間明けに観戦者を退去させる
    ///
    /// タイマー発火時点でルームが消えていれば何もしない
    pub fn evict_spectators(&mut self, room_id: RoomId) -> Option<EvictionReport> {
        let room = self.rooms.get_mut(&room_id)?;
        let winner = room.winner_display().unwrap_or_else(|| "Unknown".to_string());

        let spectator_connections: Vec<ConnectionId> = room
            .spectators()
            .iter()
            .map(|s| s.connection_id.clone())
            .collect();
        for connection in &spectator_connections {
            room.remove_connection(connection);
            self.connection_to_room.remove(connection);
        }

        let room_deleted = self
            .rooms
            .get(&room_id)
            .map(Room::is_empty)
            .unwrap_or(false);
        if room_deleted {
            self.rooms.remove(&room_id);
        }

        Some(EvictionReport {
            room_id,
            evicted: spectator_connections,
            winner,
            room_deleted,
        })
    }

    // ------------------------------------------------------------
    // 招待
    // ------------------------------------------------------------

    /// Send an invitation. The recipient must be online and idle, and the
    /// sender must not be in a room. One pending invitation per recipient;
    /// a newer one overwrites the older.
    pub fn send_invitation(
        &mut self,
        connection_id: &ConnectionId,
        to: &str,
        game_type: GameType,
    ) -> Result<InvitationSent, HubError> {
        let from = self
            .online_users
            .get(connection_id)
            .ok_or(HubError::UnknownConnection)?
            .clone();

        let recipient = self
            .find_connection_by_username(to)
            .ok_or_else(|| HubError::UserOffline(to.to_string()))?;
        if self.connection_to_room.contains_key(&recipient) {
            return Err(HubError::UserBusy(to.to_string()));
        }
        if self.connection_to_room.contains_key(connection_id) {
            return Err(HubError::AlreadyInGame);
        }

        let recipient_username = self
            .online_users
            .get(&recipient)
            .ok_or(HubError::UnknownConnection)?
            .clone();
        self.pending_invitations.insert(
            recipient_username,
            Invitation {
                from: from.clone(),
                game_type,
            },
        );

        Ok(InvitationSent {
            recipient_connection: recipient,
            from,
            game_type,
        })
    }

    /// Accept a pending invitation: validates the stored sender, consumes
    /// the entry, and atomically creates a room with the sender as X and
    /// the acceptor as O. Any failure aborts with no state committed.
    pub fn accept_invitation(
        &mut self,
        connection_id: &ConnectionId,
        from: &str,
        now: Timestamp,
    ) -> Result<InvitationAccepted, HubError> {
        let to = self
            .online_users
            .get(connection_id)
            .ok_or(HubError::UnknownConnection)?
            .clone();

        let invitation = match self.pending_invitations.get(&to) {
            Some(invitation) if invitation.from.as_str() == from => invitation.clone(),
            _ => return Err(HubError::InvitationNotFound),
        };
        self.pending_invitations.remove(&to);

        let sender_connection = self
            .find_connection_by_username(from)
            .ok_or_else(|| HubError::SenderGone(from.to_string()))?;
        if self.connection_to_room.contains_key(&sender_connection) {
            return Err(HubError::UserBusy(from.to_string()));
        }
        if self.connection_to_room.contains_key(connection_id) {
            return Err(HubError::AlreadyInGame);
        }

        let room_id = self.generate_room_id(&mut rand::thread_rng());
        let room_name = RoomName::new(format!("{from} vs {to}"))
            .unwrap_or_else(|_| RoomName::default_for(room_id));
        let mut room = Room::new(room_id, room_name, invitation.game_type, now);

        let sender_player = room.add_player(sender_connection.clone(), invitation.from.clone())?;
        let acceptor_player = room.add_player(connection_id.clone(), to)?;

        // 両者の追加に成功してから初めてレジストリに載せる
        let accepted = InvitationAccepted {
            room_id,
            room_name: room.room_name.to_string(),
            game_type: room.game_type(),
            sender_connection: sender_connection.clone(),
            sender_player: PlayerView::from(&sender_player),
            acceptor_player: PlayerView::from(&acceptor_player),
            players: room.players().iter().map(PlayerView::from).collect(),
            first_turn: Role::X,
            game_state: room.game_state_view(),
            targets: room.member_connections(),
        };
        self.rooms.insert(room_id, room);
        self.connection_to_room
            .insert(sender_connection, room_id);
        self.connection_to_room
            .insert(connection_id.clone(), room_id);
        Ok(accepted)
    }

    /// 招待を辞退する。送信者がオンラインなら通知対象を返す
    pub fn decline_invitation(
        &mut self,
        connection_id: &ConnectionId,
        from: &str,
    ) -> Result<InvitationDeclined, HubError> {
        let to = self
            .online_users
            .get(connection_id)
            .ok_or(HubError::UnknownConnection)?
            .clone();
        self.pending_invitations.remove(&to);
        Ok(InvitationDeclined {
            sender_connection: self.find_connection_by_username(from),
            to,
        })
    }

    pub fn pending_invitation_for(&self, recipient: &Username) -> Option<&Invitation> {
        self.pending_invitations.get(recipient)
    }

    fn find_connection_by_username(&self, username: &str) -> Option<ConnectionId> {
        self.online_users
            .iter()
            .find(|(_, u)| u.as_str() == username)
            .map(|(c, _)| c.clone())
    }

    // ------------------------------------------------------------
    // 参照系
    // ------------------------------------------------------------

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_of_connection(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.connection_to_room.get(connection_id).copied()
    }
}
