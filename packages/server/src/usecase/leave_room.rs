//! UseCase: 明示的な退室
//!
//! 進行中の 2 人対戦からの退室は切断と同じく強制敗北です。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Departure, HubError, HubRepository, RoomId, StatsRepository, Winner,
};

use super::record_game_result;

/// 退室のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn HubRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl LeaveRoomUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, stats: Arc<dyn StatsRepository>) -> Self {
        Self { repository, stats }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<Departure, HubError> {
        let departure = self.repository.leave_room(connection_id, room_id).await?;

        if let Departure::Forfeit {
            winner,
            players,
            game_type,
            ..
        } = &departure
        {
            record_game_result(
                &self.stats,
                Winner::from_role(winner.role),
                players.clone(),
                *game_type,
            )
            .await;
        }

        Ok(departure)
    }
}
