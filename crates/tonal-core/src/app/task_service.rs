//! TaskService - 1 件ずつ受信 → decode → 分類 → 保存 → ack するループ
//!
//! # フロー
//! 1. `DeliveryStream::next()` で配送を待つ（shutdown と競合させるのはここだけ）
//! 2. `codec::decode` で Task に変換（失敗したら ack して捨てる）
//! 3. `InferenceEngine::predict` を blocking pool で実行
//! 4. `ResultStore::put` で task id に上書き保存
//! 5. 保存できたら ack。分類・保存の失敗は ack せずにループを止める
//!
//! # 設計原則
//! - ack は保存成功の後だけ
//! - 失敗した配送はその場で requeue しない。ack しないまま接続を閉じ、
//!   broker の再配送は worker の再起動後に受ける（終了コード 3）
//! - 処理中の配送は shutdown でも最後まで終わらせる（graceful drain）
//! - ack が送れない = 接続断。ループは `WorkerError::ConnectionLoss` で終わる
//! - store の接続断は `WorkerError::StoreConnectionLoss`（終了コード 2）

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{Instrument, debug, field, info, info_span, warn};

use super::error::WorkerError;
use crate::domain::codec;
use crate::domain::errors::{InferenceError, QueueError};
use crate::domain::ids::WorkerIdentity;
use crate::domain::state::TaskState;
use crate::domain::task::Task;
use crate::observability::WorkerStats;
use crate::ports::{DeadLetterSink, Delivery, InferenceEngine, ResultStore, TaskQueue};

/// TaskService は 1 つの queue を消費する worker
///
/// `TaskServiceBuilder` で組み立てます。
pub struct TaskService {
    pub(super) identity: WorkerIdentity,
    pub(super) queue_name: String,
    pub(super) queue: Arc<dyn TaskQueue>,
    pub(super) store: Arc<dyn ResultStore>,
    pub(super) engine: Arc<dyn InferenceEngine>,
    pub(super) dead_letter: Arc<dyn DeadLetterSink>,
}

impl TaskService {
    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Consume until shutdown is signalled (or the sender is dropped).
    ///
    /// Returns the loop's counters on graceful shutdown. The first task that
    /// cannot be finished ends the loop with an error. The queue connection
    /// is closed before returning in every case, which hands unacknowledged
    /// deliveries back to the broker.
    pub async fn run(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<WorkerStats, WorkerError> {
        let mut stream = self
            .queue
            .subscribe(&self.queue_name)
            .await
            .map_err(WorkerError::Subscribe)?;
        info!(worker = %self.identity, queue = %self.queue_name, "waiting for tasks");

        let mut stats = WorkerStats::default();
        let outcome = loop {
            if *shutdown.borrow() {
                break Ok(());
            }

            // receive だけを shutdown と競合させる。処理中の配送は中断しない
            let next = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // sender が drop された
                        break Ok(());
                    }
                    continue;
                }
                next = stream.next() => next,
            };

            let delivery = match next {
                Ok(Some(delivery)) => delivery,
                Ok(None) => {
                    break Err(WorkerError::ConnectionLoss(QueueError::ConnectionLost(
                        "delivery stream ended".to_string(),
                    )));
                }
                Err(e) => break Err(WorkerError::ConnectionLoss(e)),
            };

            let span = info_span!(
                "task",
                worker = %self.identity,
                task_id = field::Empty,
                redelivered = delivery.redelivered(),
            );
            if let Err(e) = self.process(delivery, &mut stats).instrument(span).await {
                break Err(e);
            }
        };

        drop(stream);
        if let Err(e) = self.queue.close().await {
            warn!(worker = %self.identity, error = %e, "failed to close queue connection");
        }

        match &outcome {
            Ok(()) => info!(worker = %self.identity, ?stats, "consume loop stopped"),
            Err(e) => warn!(worker = %self.identity, ?stats, error = %e, "consume loop aborted"),
        }
        outcome.map(|()| stats)
    }

    /// Drive one delivery to a terminal state.
    ///
    /// A malformed payload is acked and reported as `Ok`. Any other failure
    /// drops the delivery without settling it and is returned for `run` to
    /// stop on.
    async fn process(
        &self,
        delivery: Box<dyn Delivery>,
        stats: &mut WorkerStats,
    ) -> Result<TaskState, WorkerError> {
        let mut walk = Walk::start(stats);

        let task = match codec::decode(delivery.payload()) {
            Ok(task) => task,
            Err(err) => {
                warn!(
                    task_id = err.task_id.as_deref().unwrap_or("<unknown>"),
                    bytes = err.payload_len,
                    reason = %err.reason,
                    "dropping malformed task"
                );
                walk.advance(TaskState::Dropped);
                if let Err(e) = self.dead_letter.publish(delivery.payload(), &err.reason).await {
                    warn!(error = %e, "failed to dead-letter malformed payload");
                }
                delivery.ack().await.map_err(WorkerError::ConnectionLoss)?;
                return Ok(walk.advance(TaskState::Acknowledged));
            }
        };
        tracing::Span::current().record("task_id", task.id.as_str());
        walk.advance(TaskState::Decoded);

        let task_id = task.id.clone();
        let task = match self.classify(task).await {
            Ok(task) => task,
            Err(e) => {
                warn!(error = %e, "classification failed, leaving task unacknowledged");
                drop(delivery);
                walk.advance(TaskState::Unacknowledged);
                return Err(WorkerError::Unprocessed {
                    task_id,
                    source: e.into(),
                });
            }
        };
        walk.advance(TaskState::Classified);

        if let Err(e) = self.store.put(&task.id, &task).await {
            warn!(error = %e, "failed to store result, leaving task unacknowledged");
            drop(delivery);
            walk.advance(TaskState::Unacknowledged);
            return Err(if e.is_connection_lost() {
                WorkerError::StoreConnectionLoss(e)
            } else {
                WorkerError::Unprocessed {
                    task_id,
                    source: e.into(),
                }
            });
        }
        walk.advance(TaskState::Published);

        delivery.ack().await.map_err(WorkerError::ConnectionLoss)?;
        info!(
            messages = task.messages.len(),
            classes = %task.class_summary(),
            "task processed"
        );
        Ok(walk.advance(TaskState::Acknowledged))
    }

    async fn classify(&self, task: Task) -> Result<Task, InferenceError> {
        let texts = task.texts();
        if texts.is_empty() {
            return Ok(task);
        }

        let engine = Arc::clone(&self.engine);
        let classes = tokio::task::spawn_blocking(move || engine.predict(&texts))
            .await
            .map_err(|e| InferenceError::Panicked(e.to_string()))??;

        task.annotate(classes)
    }
}

/// 1 配送ぶんの状態遷移を追いかける
struct Walk<'a> {
    state: TaskState,
    stats: &'a mut WorkerStats,
}

impl<'a> Walk<'a> {
    fn start(stats: &'a mut WorkerStats) -> Self {
        stats.record(TaskState::Received);
        Self {
            state: TaskState::Received,
            stats,
        }
    }

    fn advance(&mut self, next: TaskState) -> TaskState {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "task state");
        self.stats.record(next);
        self.state = next;
        next
    }
}
