//! UseCase: 接続受け入れ
//!
//! 認証済みのユーザー名を持った新しい WebSocket 接続を受け入れます。
//! 認証そのものは HTTP 境界の手前で済んでいる前提で、ここでは
//! 接続をオンライン表と MessagePusher に登録するだけです。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, HubRepository, LobbyMessage, LobbyState, MessagePusher, PusherChannel, Username,
};

/// 接続受け入れのユースケース
pub struct ConnectPlayerUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectPlayerUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 接続を登録し、新規接続に流すロビーチャット履歴を返す
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        username: Username,
        sender: PusherChannel,
    ) -> Vec<LobbyMessage> {
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        self.repository.register_user(connection_id, username).await
    }

    /// ロビー状態と配信先（全オンライン接続）を取得する
    pub async fn lobby_snapshot(&self) -> (LobbyState, Vec<ConnectionId>) {
        let lobby = self.repository.lobby_state().await;
        let targets = self.repository.all_connections().await;
        (lobby, targets)
    }
}
