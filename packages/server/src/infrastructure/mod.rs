//! Infrastructure 層
//!
//! ドメイン層が定義するインターフェースの具体的な実装
//! （インメモリのレジストリ・スコアボード、WebSocket の
//! MessagePusher）と、ワイヤフォーマットの DTO。

pub mod dto;
pub mod message_pusher;
pub mod repository;
