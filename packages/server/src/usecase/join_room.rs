//! UseCase: ルーム参加
//!
//! 参加の検証はすべて状態を変更する前に行われる（Repository 側の
//! 単一トランジション）ため、拒否されても接続⇔ルーム対応が
//! 中途半端に残ることはありません。

use std::sync::Arc;

use crate::domain::{ConnectionId, HubError, HubRepository, JoinOutcome, RoomId};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn HubRepository>,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn HubRepository>) -> Self {
        Self { repository }
    }

    /// プレイヤーまたは観戦者として参加する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        as_spectator: bool,
    ) -> Result<JoinOutcome, HubError> {
        self.repository
            .join_room(connection_id, room_id, as_spectator)
            .await
    }
}
