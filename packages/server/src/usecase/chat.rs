//! UseCase: チャット
//!
//! ロビーチャットは直近の履歴（リングバッファ）を持ち、新規接続に
//! 再生されます。ルームチャットはそのルームのメンバーにだけ流す
//! エコーで、履歴は持ちません。

use std::sync::Arc;

use asobiba_shared::time::get_jst_timestamp;

use crate::domain::{
    ConnectionId, HubError, HubRepository, LobbyMessage, RoomChat, RoomId, Timestamp,
};

/// チャットのユースケース
pub struct ChatUseCase {
    repository: Arc<dyn HubRepository>,
}

impl ChatUseCase {
    pub fn new(repository: Arc<dyn HubRepository>) -> Self {
        Self { repository }
    }

    /// ロビーチャットに 1 件追加し、配信内容と宛先を返す
    pub async fn lobby_message(
        &self,
        connection_id: &ConnectionId,
        message: &str,
    ) -> Result<(LobbyMessage, Vec<ConnectionId>), HubError> {
        let now = Timestamp::new(get_jst_timestamp());
        self.repository
            .push_lobby_message(connection_id, message, now)
            .await
    }

    /// ルームチャットの配信内容を作る
    pub async fn room_message(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        message: &str,
    ) -> Result<RoomChat, HubError> {
        let now = Timestamp::new(get_jst_timestamp());
        self.repository
            .room_chat(connection_id, room_id, message, now)
            .await
    }
}
