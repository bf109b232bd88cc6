//! Errors - エラー型と分類
//!
//! エラーはタスク境界でどう扱うかで分類されます：
//! - **MalformedTaskError**: ローカルで回収（ログ → ack → drop）
//! - **InferenceError / StoreError**: ack しない。ループを止めて接続を閉じ、再配送は broker に任せる
//!   （その場で requeue すると同じ task が即座に戻ってきて busy loop になる）
//! - **QueueError / StoreError::ConnectionLost**: 接続断。プロセス終了 → supervisor が再起動

use thiserror::Error;

use super::sentiment::InvalidClassId;

/// payload が Task として解釈できなかった
///
/// `task_id` は生の JSON から id だけ拾えた場合に入る（ログ用）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed task (id={}, {payload_len} bytes): {reason}", task_id.as_deref().unwrap_or("<unknown>"))]
pub struct MalformedTaskError {
    pub task_id: Option<String>,
    pub payload_len: usize,
    pub reason: String,
}

/// 推論の失敗（truncation で吸収できないもの）
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("tokenizer failure: {0}")]
    Tokenizer(String),

    #[error("model failure: {0}")]
    Model(String),

    #[error("engine produced an invalid class id: {0}")]
    ContractViolation(#[from] InvalidClassId),

    #[error("engine returned {actual} predictions for {expected} texts")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("inference panicked: {0}")]
    Panicked(String),
}

/// ResultStore の失敗
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store unavailable: {0}")]
    Unavailable(String),

    /// The connection to the store dropped or was refused mid-run.
    #[error("result store connection lost: {0}")]
    ConnectionLost(String),

    #[error("failed to encode task: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("stored record for key={key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Queue (broker) 側の失敗
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue not found: {queue} ({reason})")]
    QueueNotFound { queue: String, reason: String },

    #[error("failed to connect to broker: {0}")]
    Connection(String),

    #[error("broker connection lost: {0}")]
    ConnectionLost(String),

    #[error("failed to settle delivery: {0}")]
    Settle(String),

    #[error("failed to publish: {0}")]
    Publish(String),
}

impl StoreError {
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, StoreError::ConnectionLost(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_error_mentions_id_when_known() {
        let err = MalformedTaskError {
            task_id: Some("t1".to_string()),
            payload_len: 12,
            reason: "missing field `messages`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("id=t1"));
        assert!(msg.contains("messages"));
    }

    #[test]
    fn malformed_error_falls_back_to_payload_size() {
        let err = MalformedTaskError {
            task_id: None,
            payload_len: 3,
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("id=<unknown>, 3 bytes"));
    }

    #[test]
    fn invalid_class_id_converts_into_contract_violation() {
        let err: InferenceError = InvalidClassId(5).into();
        assert!(matches!(err, InferenceError::ContractViolation(InvalidClassId(5))));
    }

    #[test]
    fn only_connection_lost_counts_as_connection_loss() {
        assert!(StoreError::ConnectionLost("reset by peer".into()).is_connection_lost());
        assert!(!StoreError::Unavailable("READONLY".into()).is_connection_lost());
        assert!(
            !StoreError::Corrupt {
                key: "t1".into(),
                reason: "eof".into()
            }
            .is_connection_lost()
        );
    }
}
