//! AmqpTaskQueue - RabbitMQ 上の TaskQueue / DeadLetterSink
//!
//! # 実装詳細
//! - subscribe は passive declare で queue の存在だけ確認する（作らない）
//! - `basic.qos` で prefetch を絞る（既定 1 = 1 件ずつ処理）
//! - ack しなかった配送は channel を閉じた時点で broker が queue に戻す（nack はしない）
//! - consumer stream が終わる / エラーになる = 接続断

use async_trait::async_trait;
use futures::StreamExt;
use lapin::message::Delivery as LapinDelivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};
use tracing::{debug, info};

use crate::domain::errors::QueueError;
use crate::ports::{DeadLetterSink, Delivery, DeliveryStream, TaskQueue};

/// RabbitMQ consumer side.
pub struct AmqpTaskQueue {
    connection: Connection,
    channel: Channel,
    prefetch: u16,
    consumer_tag: String,
}

impl AmqpTaskQueue {
    /// Connect and open one channel. Fails fast if the broker is unreachable.
    pub async fn connect(url: &str, prefetch: u16, consumer_tag: &str) -> Result<Self, QueueError> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| QueueError::Connection(format!("failed to connect to RabbitMQ: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| QueueError::Connection(format!("failed to create channel: {e}")))?;

        info!(prefetch, "connected to RabbitMQ");

        Ok(Self {
            connection,
            channel,
            prefetch,
            consumer_tag: consumer_tag.to_string(),
        })
    }

    /// Dead-letter publisher sharing this connection's channel.
    pub async fn dead_letter(&self, queue: &str) -> Result<AmqpDeadLetter, QueueError> {
        AmqpDeadLetter::declare(self.channel.clone(), queue).await
    }
}

#[async_trait]
impl TaskQueue for AmqpTaskQueue {
    async fn subscribe(&self, queue: &str) -> Result<Box<dyn DeliveryStream>, QueueError> {
        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    passive: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| QueueError::QueueNotFound {
                queue: queue.to_string(),
                reason: e.to_string(),
            })?;

        self.channel
            .basic_qos(self.prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| QueueError::Connection(format!("failed to set prefetch: {e}")))?;

        let consumer = self
            .channel
            .basic_consume(
                queue,
                &self.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| QueueError::Connection(format!("failed to start consumer on {queue}: {e}")))?;

        info!(queue, consumer_tag = %self.consumer_tag, "subscribed");
        Ok(Box::new(AmqpDeliveryStream { consumer }))
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.channel
            .close(200, "worker shutdown")
            .await
            .map_err(|e| QueueError::ConnectionLost(format!("failed to close channel: {e}")))?;
        self.connection
            .close(200, "worker shutdown")
            .await
            .map_err(|e| QueueError::ConnectionLost(format!("failed to close connection: {e}")))
    }
}

struct AmqpDeliveryStream {
    consumer: Consumer,
}

#[async_trait]
impl DeliveryStream for AmqpDeliveryStream {
    async fn next(&mut self) -> Result<Option<Box<dyn Delivery>>, QueueError> {
        match self.consumer.next().await {
            None => Ok(None),
            Some(Ok(delivery)) => Ok(Some(Box::new(AmqpDelivery { inner: delivery }))),
            Some(Err(e)) => Err(QueueError::ConnectionLost(e.to_string())),
        }
    }
}

struct AmqpDelivery {
    inner: LapinDelivery,
}

#[async_trait]
impl Delivery for AmqpDelivery {
    fn payload(&self) -> &[u8] {
        &self.inner.data
    }

    fn redelivered(&self) -> bool {
        self.inner.redelivered
    }

    async fn ack(self: Box<Self>) -> Result<(), QueueError> {
        self.inner
            .acker
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| QueueError::Settle(format!("ack failed: {e}")))
    }
}

/// Publishes dropped payloads to a durable queue via the default exchange.
///
/// The drop reason travels in the `x-drop-reason` header.
pub struct AmqpDeadLetter {
    channel: Channel,
    queue: String,
}

impl AmqpDeadLetter {
    async fn declare(channel: Channel, queue: &str) -> Result<Self, QueueError> {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| QueueError::Connection(format!("failed to declare dead-letter queue {queue}: {e}")))?;

        Ok(Self {
            channel,
            queue: queue.to_string(),
        })
    }
}

#[async_trait]
impl DeadLetterSink for AmqpDeadLetter {
    async fn publish(&self, payload: &[u8], reason: &str) -> Result<(), QueueError> {
        let mut headers = FieldTable::default();
        headers.insert("x-drop-reason".into(), AMQPValue::LongString(reason.into()));

        self.channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_headers(headers),
            )
            .await
            .map_err(|e| QueueError::Publish(format!("dead-letter publish failed: {e}")))?;

        debug!(queue = %self.queue, bytes = payload.len(), "dead-lettered payload");
        Ok(())
    }
}
