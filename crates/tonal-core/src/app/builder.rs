//! TaskServiceBuilder - TaskService の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 足りない部品を全部まとめて報告する（1 つずつ直させない）

use std::sync::Arc;

use crate::domain::ids::WorkerIdentity;
use crate::ports::{DeadLetterSink, InferenceEngine, NoopDeadLetter, ResultStore, TaskQueue};

use super::task_service::TaskService;

/// TaskServiceBuilder は TaskService を組み立てる
///
/// # 使用例
/// ```ignore
/// let service = TaskServiceBuilder::new()
///     .identity(WorkerIdentity::new("ml-1"))
///     .queue(Arc::new(queue))
///     .queue_name("tasks")
///     .store(Arc::new(store))
///     .engine(Arc::new(engine))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - queue / queue 名 / store / engine は必須
/// - build() 時に欠けているものを `BuildError::MissingComponents` で返す
/// - identity は省略時 `worker-<pid>`、dead letter は省略時 NoopDeadLetter
#[derive(Default)]
pub struct TaskServiceBuilder {
    identity: Option<WorkerIdentity>,
    queue: Option<Arc<dyn TaskQueue>>,
    queue_name: Option<String>,
    store: Option<Arc<dyn ResultStore>>,
    engine: Option<Arc<dyn InferenceEngine>>,
    dead_letter: Option<Arc<dyn DeadLetterSink>>,
}

/// BuildError は TaskService 構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Missing components: {0:?}. These must be set before build().")]
    MissingComponents(Vec<&'static str>),
}

impl TaskServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(mut self, identity: WorkerIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn queue_name(mut self, name: impl Into<String>) -> Self {
        self.queue_name = Some(name.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub fn store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn InferenceEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn dead_letter(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letter = Some(sink);
        self
    }

    /// 必須部品が揃っていれば TaskService を生成
    pub fn build(self) -> Result<TaskService, BuildError> {
        let mut missing = Vec::new();
        if self.queue.is_none() {
            missing.push("queue");
        }
        if self.queue_name.is_none() {
            missing.push("queue_name");
        }
        if self.store.is_none() {
            missing.push("store");
        }
        if self.engine.is_none() {
            missing.push("engine");
        }

        match (self.queue, self.queue_name, self.store, self.engine) {
            (Some(queue), Some(queue_name), Some(store), Some(engine)) => Ok(TaskService {
                identity: self.identity.unwrap_or_else(WorkerIdentity::from_pid),
                queue_name,
                queue,
                store,
                engine,
                dead_letter: self
                    .dead_letter
                    .unwrap_or_else(|| Arc::new(NoopDeadLetter)),
            }),
            _ => Err(BuildError::MissingComponents(missing)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryResultStore, InMemoryTaskQueue, LexiconEngine};

    #[test]
    fn test_build_success() {
        let service = TaskServiceBuilder::new()
            .identity(WorkerIdentity::new("ml-1"))
            .queue(Arc::new(InMemoryTaskQueue::new()))
            .queue_name("tasks")
            .store(Arc::new(InMemoryResultStore::new()))
            .engine(Arc::new(LexiconEngine::new()))
            .build()
            .unwrap();

        assert_eq!(service.identity().as_str(), "ml-1");
        assert_eq!(service.queue_name(), "tasks");
    }

    #[test]
    fn test_build_reports_every_missing_component() {
        let err = TaskServiceBuilder::new()
            .store(Arc::new(InMemoryResultStore::new()))
            .build()
            .err()
            .unwrap();

        assert_eq!(
            err,
            BuildError::MissingComponents(vec!["queue", "queue_name", "engine"])
        );
    }

    #[test]
    fn test_empty_queue_name_counts_as_missing() {
        let err = TaskServiceBuilder::new()
            .queue(Arc::new(InMemoryTaskQueue::new()))
            .queue_name("")
            .store(Arc::new(InMemoryResultStore::new()))
            .engine(Arc::new(LexiconEngine::new()))
            .build()
            .err()
            .unwrap();

        assert_eq!(err, BuildError::MissingComponents(vec!["queue_name"]));
    }

    #[test]
    fn test_identity_defaults_to_pid() {
        let service = TaskServiceBuilder::new()
            .queue(Arc::new(InMemoryTaskQueue::new()))
            .queue_name("tasks")
            .store(Arc::new(InMemoryResultStore::new()))
            .engine(Arc::new(LexiconEngine::new()))
            .build()
            .unwrap();

        assert_eq!(
            service.identity().as_str(),
            format!("worker-{}", std::process::id())
        );
    }
}
