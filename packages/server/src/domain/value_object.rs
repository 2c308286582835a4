//! 値オブジェクト定義
//!
//! ドメイン層で使う識別子・列挙型をここにまとめます。
//! 生の `String` を層の境界で受け取ったら、まずこれらに変換してから
//! ドメインロジックに渡します（不正値は境界で弾く）。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 1 本の WebSocket 接続を表す ID（サーバ側で UUID v4 から生成）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a connection id from a server-generated token.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Generate a fresh random connection id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 認証済みユーザー名
///
/// 認証自体は外部（HTTP 層の手前）で済んでいる前提で、ここでは
/// 表示名としての妥当性（空でない・長すぎない）のみ検証します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

/// ユーザー名の最大長（文字数）
pub const USERNAME_MAX_CHARS: usize = 32;

impl Username {
    /// Validate and wrap a display name. Leading/trailing whitespace is
    /// trimmed; empty or overlong names are rejected.
    pub fn new(value: String) -> Result<Self, InvalidValue> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(InvalidValue::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX_CHARS {
            return Err(InvalidValue::UsernameTooLong);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ルーム ID（6 桁の数値、生成時に衝突を再抽選で回避）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(u32);

impl RoomId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ルームの表示名（未指定なら "Room <id>"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(value: String) -> Result<Self, InvalidValue> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(InvalidValue::EmptyRoomName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Default display name derived from the room id.
    pub fn default_for(room_id: RoomId) -> Self {
        Self(format!("Room {}", room_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 対応しているゲームの種類
///
/// 入力はパース時に正規化されます（小文字化、`_` → `-`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    #[serde(rename = "tic-tac-toe")]
    TicTacToe,
    #[serde(rename = "rock-paper-scissors")]
    RockPaperScissors,
    #[serde(rename = "memory-match")]
    MemoryMatch,
}

impl GameType {
    /// Parse a game type identifier, normalizing case and separators.
    pub fn parse(value: &str) -> Result<Self, InvalidValue> {
        let normalized = value.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "tic-tac-toe" => Ok(Self::TicTacToe),
            "rock-paper-scissors" => Ok(Self::RockPaperScissors),
            "memory-match" => Ok(Self::MemoryMatch),
            _ => Err(InvalidValue::UnknownGameType(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TicTacToe => "tic-tac-toe",
            Self::RockPaperScissors => "rock-paper-scissors",
            Self::MemoryMatch => "memory-match",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ルーム内での座席（先着が X、後着が O）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    X,
    O,
}

impl Role {
    /// The opposing seat.
    pub fn opponent(&self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unix タイムスタンプ（JST、ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidValue {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be at most {USERNAME_MAX_CHARS} characters")]
    UsernameTooLong,
    #[error("room name must not be empty")]
    EmptyRoomName,
    #[error("unknown game type: {0}")]
    UnknownGameType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_trims_whitespace() {
        // テスト項目: ユーザー名の前後の空白が取り除かれる
        // given (前提条件):
        let raw = "  alice  ".to_string();

        // when (操作):
        let username = Username::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(username.as_str(), "alice");
    }

    #[test]
    fn test_username_rejects_empty() {
        // テスト項目: 空のユーザー名は拒否される
        // given (前提条件):
        let raw = "   ".to_string();

        // when (操作):
        let result = Username::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(InvalidValue::EmptyUsername));
    }

    #[test]
    fn test_username_rejects_overlong() {
        // テスト項目: 長すぎるユーザー名は拒否される
        // given (前提条件):
        let raw = "x".repeat(USERNAME_MAX_CHARS + 1);

        // when (操作):
        let result = Username::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(InvalidValue::UsernameTooLong));
    }

    #[test]
    fn test_game_type_parse_normalizes_input() {
        // テスト項目: ゲーム種別のパースで大文字と `_` が正規化される
        // given (前提条件):
        let inputs = ["Tic_Tac_Toe", "tic-tac-toe", "TIC-TAC-TOE"];

        // when (操作) / then (期待する結果):
        for input in inputs {
            assert_eq!(GameType::parse(input), Ok(GameType::TicTacToe));
        }
        assert_eq!(
            GameType::parse("rock_paper_scissors"),
            Ok(GameType::RockPaperScissors)
        );
        assert_eq!(GameType::parse("memory_match"), Ok(GameType::MemoryMatch));
    }

    #[test]
    fn test_game_type_parse_rejects_unknown() {
        // テスト項目: 未知のゲーム種別はエラーになる
        // given (前提条件):
        let input = "chess";

        // when (操作):
        let result = GameType::parse(input);

        // then (期待する結果):
        assert!(matches!(result, Err(InvalidValue::UnknownGameType(_))));
    }

    #[test]
    fn test_role_opponent() {
        // テスト項目: 相手側の座席が返される
        assert_eq!(Role::X.opponent(), Role::O);
        assert_eq!(Role::O.opponent(), Role::X);
    }

    #[test]
    fn test_connection_id_generate_is_unique() {
        // テスト項目: 生成される接続 ID が重複しない
        // given (前提条件) / when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }

    #[test]
    fn test_room_name_default_for() {
        // テスト項目: 省略時のルーム名が "Room <id>" になる
        // given (前提条件):
        let room_id = RoomId::new(123456);

        // when (操作):
        let name = RoomName::default_for(room_id);

        // then (期待する結果):
        assert_eq!(name.as_str(), "Room 123456");
    }
}
