//! TaskQueue port - 配送キュー（RabbitMQ または InMemory）
//!
//! TaskQueue は payload を解釈しません（framing と ack だけ）。
//!
//! # 設計原則
//! - at-least-once: ack されなかった配送は接続が閉じた時に broker が再配送する
//! - 失敗した配送をその場で requeue する操作はない（ack するか、手放して接続を閉じるか）
//! - stream は無限・再開不可。接続が切れたら `Ok(None)` で終わる
//! - queue が存在しない場合は subscribe 時点で即エラー（設定ミス扱い）

use async_trait::async_trait;

use crate::domain::errors::QueueError;

/// A delivered message.
///
/// Acking consumes the box, so a delivery cannot be acknowledged twice.
/// Dropping it without `ack` leaves it unacknowledged: the broker hands it
/// out again only after this connection closes.
#[async_trait]
pub trait Delivery: Send {
    /// Raw message body, uninterpreted.
    fn payload(&self) -> &[u8];

    /// True when the broker has delivered this message before.
    fn redelivered(&self) -> bool;

    /// Mark as processed. The broker forgets the message.
    async fn ack(self: Box<Self>) -> Result<(), QueueError>;
}

/// Infinite stream of deliveries from one subscription.
#[async_trait]
pub trait DeliveryStream: Send {
    /// Wait for the next delivery.
    ///
    /// `Ok(None)` means the connection closed and the stream is over.
    /// Must be cancel-safe: dropping the future must not lose a delivery.
    async fn next(&mut self) -> Result<Option<Box<dyn Delivery>>, QueueError>;
}

/// Queue port (interface).
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Start consuming `queue`. Fails with `QueueError::QueueNotFound` when the
    /// destination does not exist.
    async fn subscribe(&self, queue: &str) -> Result<Box<dyn DeliveryStream>, QueueError>;

    /// Close the broker connection. Called once the consume loop has stopped;
    /// unacknowledged deliveries go back to the queue.
    async fn close(&self) -> Result<(), QueueError>;
}
