//! UseCase: 再戦投票
//!
//! 決着済みのルームでのみ有効。両プレイヤーの投票が揃った時点で
//! ゲーム状態が全リセットされ、三目並べは先手が交代します。

use std::sync::Arc;

use crate::domain::{ConnectionId, HubError, HubRepository, RestartOutcome, RoomId};

/// 再戦投票のユースケース
pub struct RestartGameUseCase {
    repository: Arc<dyn HubRepository>,
}

impl RestartGameUseCase {
    pub fn new(repository: Arc<dyn HubRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<RestartOutcome, HubError> {
        self.repository.request_restart(connection_id, room_id).await
    }
}
