//! Conversion logic between domain reports and wire DTOs.

use crate::domain::{FlipReport, LobbyMessage, RoomChat, RoomId, RpsRoundReport};

use super::websocket::{
    LobbyChatMessage, MemoryOutcome, MemoryResultMessage, MessageType, RoomChatMessage,
    RpsResultMessage,
};

// ========================================
// Domain → DTO
// ========================================

impl From<&LobbyMessage> for LobbyChatMessage {
    fn from(entry: &LobbyMessage) -> Self {
        Self {
            r#type: MessageType::LobbyMessage,
            username: entry.username.clone(),
            message: entry.message.clone(),
            timestamp: entry.timestamp.value(),
        }
    }
}

impl From<&RoomChat> for RoomChatMessage {
    fn from(chat: &RoomChat) -> Self {
        Self {
            r#type: MessageType::RoomMessage,
            room_id: chat.room_id,
            username: chat.username.clone(),
            message: chat.message.clone(),
            timestamp: chat.timestamp.value(),
        }
    }
}

impl MemoryResultMessage {
    pub fn from_report(room_id: RoomId, report: &FlipReport) -> Self {
        match report {
            FlipReport::Revealed { card } => Self {
                r#type: MessageType::MemoryResult,
                room_id,
                outcome: MemoryOutcome::Revealed,
                cards: vec![*card],
                matches: None,
                next_turn: None,
                winner: None,
            },
            FlipReport::Matched {
                cards,
                matches,
                game_over,
            } => Self {
                r#type: MessageType::MemoryResult,
                room_id,
                outcome: MemoryOutcome::Matched,
                cards: cards.to_vec(),
                matches: Some(*matches),
                next_turn: None,
                winner: *game_over,
            },
            FlipReport::Mismatch { cards, next_turn } => Self {
                r#type: MessageType::MemoryResult,
                room_id,
                outcome: MemoryOutcome::Mismatch,
                cards: cards.to_vec(),
                matches: None,
                next_turn: Some(*next_turn),
                winner: None,
            },
        }
    }
}

impl RpsResultMessage {
    pub fn from_report(
        report: &RpsRoundReport,
        winner_username: Option<String>,
        game_winner_username: Option<String>,
    ) -> Self {
        Self {
            r#type: MessageType::RpsResult,
            choice_x: report.choice_x,
            choice_o: report.choice_o,
            winner: report.winner,
            winner_username,
            round: report.round,
            scores: report.scores,
            game_over: report.game_over,
            game_winner: game_winner_username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoleScores, Timestamp, Winner};

    #[test]
    fn test_lobby_message_to_dto() {
        // テスト項目: ロビーチャットのドメイン型が DTO に変換される
        // given (前提条件):
        let entry = LobbyMessage {
            username: "alice".to_string(),
            message: "hi".to_string(),
            timestamp: Timestamp::new(1000),
        };

        // when (操作):
        let dto = LobbyChatMessage::from(&entry);

        // then (期待する結果):
        assert_eq!(dto.username, "alice");
        assert_eq!(dto.message, "hi");
        assert_eq!(dto.timestamp, 1000);
        assert!(matches!(dto.r#type, MessageType::LobbyMessage));
    }

    #[test]
    fn test_mismatch_report_to_dto() {
        // テスト項目: 不一致レポートが次の手番付きで DTO になる
        // given (前提条件):
        let report = FlipReport::Mismatch {
            cards: [3, 7],
            next_turn: crate::domain::Role::O,
        };

        // when (操作):
        let dto = MemoryResultMessage::from_report(RoomId::new(1), &report);

        // then (期待する結果):
        assert_eq!(dto.outcome, MemoryOutcome::Mismatch);
        assert_eq!(dto.cards, vec![3, 7]);
        assert_eq!(dto.next_turn, Some(crate::domain::Role::O));
        assert_eq!(dto.winner, None);
    }

    #[test]
    fn test_final_match_report_carries_winner() {
        // テスト項目: 決着したマッチのレポートに勝敗が載る
        // given (前提条件):
        let report = FlipReport::Matched {
            cards: [0, 9],
            matches: RoleScores { x: 5, o: 4 },
            game_over: Some(Winner::X),
        };

        // when (操作):
        let dto = MemoryResultMessage::from_report(RoomId::new(1), &report);

        // then (期待する結果):
        assert_eq!(dto.outcome, MemoryOutcome::Matched);
        assert_eq!(dto.winner, Some(Winner::X));
        assert_eq!(dto.matches, Some(RoleScores { x: 5, o: 4 }));
    }
}
