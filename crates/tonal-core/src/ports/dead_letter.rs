//! DeadLetterSink port - drop した payload の退避先
//!
//! 未設定なら NoopDeadLetter（ログだけ残して捨てる）。

use async_trait::async_trait;

use crate::domain::errors::QueueError;

/// DeadLetterSink は decode できなかった payload を受け取る
///
/// 失敗しても ack は止めない（呼び出し側でログに残すだけ）。
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn publish(&self, payload: &[u8], reason: &str) -> Result<(), QueueError>;
}

/// 何もしない DeadLetterSink
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDeadLetter;

#[async_trait]
impl DeadLetterSink for NoopDeadLetter {
    async fn publish(&self, _payload: &[u8], _reason: &str) -> Result<(), QueueError> {
        Ok(())
    }
}
