//! InMemoryTaskQueue - 開発・テスト用の配送キュー
//!
//! # 学習ポイント
//! - Mutex + Notify による待機付き receive（cancel-safe）
//! - Box<Self> を消費する ack（二重 ack を型で防ぐ）
//! - ack されなかった配送は in_flight に残り、接続断で queue の先頭に戻る
//!
//! broker の振る舞いのうち、worker の契約に関わる部分だけを再現します：
//! at-least-once、未 ack の再配送、`redelivered` フラグ、接続断と再接続。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::domain::errors::QueueError;
use crate::ports::{Delivery, DeliveryStream, TaskQueue};

#[derive(Debug, Clone)]
struct Envelope {
    payload: Vec<u8>,
    redelivered: bool,
}

#[derive(Default)]
struct QueueState {
    /// queue 名ごとの待ち行列
    queues: HashMap<String, VecDeque<Envelope>>,
    /// delivery tag → (queue 名, 配送中のメッセージ)
    in_flight: HashMap<u64, (String, Envelope)>,
    next_tag: u64,
    acked: usize,
    closed: bool,
}

/// InMemoryTaskQueue は開発用の配送キュー
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryTaskQueue::new();
/// queue.declare("tasks");
/// queue.publish("tasks", br#"{"id":"t1","messages":[]}"#.to_vec())?;
/// let mut stream = queue.subscribe("tasks").await?;
/// let delivery = stream.next().await?.unwrap();
/// delivery.ack().await?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryTaskQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// queue を作成（既にあれば何もしない）
    pub fn declare(&self, queue: &str) {
        self.state.lock().queues.entry(queue.to_string()).or_default();
    }

    /// メッセージを末尾に追加
    pub fn publish(&self, queue: &str, payload: impl Into<Vec<u8>>) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        let pending = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound {
                queue: queue.to_string(),
                reason: "not declared".to_string(),
            })?;
        pending.push_back(Envelope {
            payload: payload.into(),
            redelivered: false,
        });
        drop(state);
        self.notify.notify_one();
        Ok(())
    }

    /// 接続断をシミュレート
    ///
    /// 未 ack の配送は配送順のまま redelivered として queue の先頭に戻り、
    /// 待機中の stream は `Ok(None)` で終わる。
    pub fn disconnect(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        let mut in_flight: Vec<_> = state.in_flight.drain().collect();
        in_flight.sort_by_key(|(tag, _)| std::cmp::Reverse(*tag));
        for (_, (queue, mut envelope)) in in_flight {
            envelope.redelivered = true;
            state.queues.entry(queue).or_default().push_front(envelope);
        }
        drop(state);
        self.notify.notify_waiters();
    }

    /// 新しい接続として subscribe できる状態に戻す（worker の再起動）
    pub fn reconnect(&self) {
        self.state.lock().closed = false;
    }

    /// queue に残っている（未配送の）メッセージ数
    pub fn pending(&self, queue: &str) -> usize {
        self.state.lock().queues.get(queue).map_or(0, VecDeque::len)
    }

    /// 配送済みで ack されていないメッセージ数
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    pub fn acked(&self) -> usize {
        self.state.lock().acked
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn subscribe(&self, queue: &str) -> Result<Box<dyn DeliveryStream>, QueueError> {
        let state = self.state.lock();
        if state.closed {
            return Err(QueueError::ConnectionLost("queue is closed".to_string()));
        }
        if !state.queues.contains_key(queue) {
            return Err(QueueError::QueueNotFound {
                queue: queue.to_string(),
                reason: "not declared".to_string(),
            });
        }
        Ok(Box::new(InMemoryDeliveryStream {
            queue: queue.to_string(),
            state: Arc::clone(&self.state),
            notify: Arc::clone(&self.notify),
        }))
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.disconnect();
        Ok(())
    }
}

struct InMemoryDeliveryStream {
    queue: String,
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl InMemoryDeliveryStream {
    /// 取り出せれば in_flight に移して返す。ロックの外で await しない。
    fn try_take(&self) -> Result<Option<InMemoryDelivery>, ()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(());
        }
        let Some(envelope) = state
            .queues
            .get_mut(&self.queue)
            .and_then(VecDeque::pop_front)
        else {
            return Ok(None);
        };

        let tag = state.next_tag;
        state.next_tag += 1;
        state
            .in_flight
            .insert(tag, (self.queue.clone(), envelope.clone()));

        Ok(Some(InMemoryDelivery {
            tag,
            envelope,
            state: Arc::clone(&self.state),
        }))
    }
}

#[async_trait]
impl DeliveryStream for InMemoryDeliveryStream {
    async fn next(&mut self) -> Result<Option<Box<dyn Delivery>>, QueueError> {
        loop {
            // 先に waiter として登録してから中身を見る（通知の取りこぼし防止）
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_take() {
                Err(()) => return Ok(None),
                Ok(Some(delivery)) => return Ok(Some(Box::new(delivery))),
                Ok(None) => notified.await,
            }
        }
    }
}

struct InMemoryDelivery {
    tag: u64,
    envelope: Envelope,
    state: Arc<Mutex<QueueState>>,
}

#[async_trait]
impl Delivery for InMemoryDelivery {
    fn payload(&self) -> &[u8] {
        &self.envelope.payload
    }

    fn redelivered(&self) -> bool {
        self.envelope.redelivered
    }

    async fn ack(self: Box<Self>) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.in_flight.remove(&self.tag).is_none() {
            return Err(QueueError::Settle(format!(
                "delivery {} is no longer in flight (channel closed)",
                self.tag
            )));
        }
        state.acked += 1;
        Ok(())
    }
}
