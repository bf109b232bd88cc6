//! App-level errors: what stops the process, and with which exit status.

use thiserror::Error;

use super::builder::BuildError;
use crate::config::ConfigError;
use crate::domain::errors::{InferenceError, QueueError, StoreError};

/// Failure before the consume loop starts. Always fatal (exit 1).
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load model: {0}")]
    Model(#[from] InferenceError),

    #[error("failed to connect to queue: {0}")]
    Queue(#[from] QueueError),

    #[error("failed to connect to result store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Failure that ends `TaskService::run`.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The queue could not be subscribed to (missing queue, broker refused).
    #[error("failed to subscribe: {0}")]
    Subscribe(#[source] QueueError),

    /// The delivery stream ended or an ack could not be sent.
    #[error("lost connection to queue: {0}")]
    ConnectionLoss(#[source] QueueError),

    /// The result store connection dropped mid-run. The delivery was left
    /// unacknowledged.
    #[error("lost connection to result store: {0}")]
    StoreConnectionLoss(#[source] StoreError),

    /// A task could not be classified or stored. The delivery was left
    /// unacknowledged and goes back to the queue when the connection closes.
    #[error("task {task_id} left unacknowledged: {source}")]
    Unprocessed {
        task_id: String,
        #[source]
        source: TaskFailure,
    },
}

impl WorkerError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkerError::Subscribe(_) => 1,
            WorkerError::ConnectionLoss(_) | WorkerError::StoreConnectionLoss(_) => 2,
            WorkerError::Unprocessed { .. } => 3,
        }
    }
}

/// Why a decoded task could not be finished.
#[derive(Debug, Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
