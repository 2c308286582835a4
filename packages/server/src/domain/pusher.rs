//! メッセージ送信（通知）の抽象化
//!
//! UseCase 層はこの trait に依存し、WebSocket などの具体的な
//! トランスポートには依存しません（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::ConnectionId;

/// クライアントへメッセージを流すチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Message Pusher trait
///
/// 接続ごとの sender の管理と、単一送信・ブロードキャストを提供する。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントを登録する
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// クライアントを登録解除する
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定のクライアントに送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントに送信する（一部の失敗は許容される）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
