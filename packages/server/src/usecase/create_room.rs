//! UseCase: ルーム作成

use std::sync::Arc;

use asobiba_shared::time::get_jst_timestamp;

use crate::domain::{
    ConnectionId, GameType, HubError, HubRepository, RoomCreated, RoomName, Timestamp,
};

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn HubRepository>,
}

impl CreateRoomUseCase {
    pub fn new(repository: Arc<dyn HubRepository>) -> Self {
        Self { repository }
    }

    /// 依頼者を最初のプレイヤー（X）としてルームを作る
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_name: Option<RoomName>,
        game_type: GameType,
    ) -> Result<RoomCreated, HubError> {
        let now = Timestamp::new(get_jst_timestamp());
        self.repository
            .create_room(connection_id, room_name, game_type, now)
            .await
    }
}
