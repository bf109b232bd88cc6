//! InMemoryDeadLetter - drop された payload を溜めておくだけの sink

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::errors::QueueError;
use crate::ports::DeadLetterSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub payload: Vec<u8>,
    pub reason: String,
}

#[derive(Default)]
pub struct InMemoryDeadLetter {
    letters: Mutex<Vec<DeadLetter>>,
}

impl InMemoryDeadLetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn letters(&self) -> Vec<DeadLetter> {
        self.letters.lock().clone()
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetter {
    async fn publish(&self, payload: &[u8], reason: &str) -> Result<(), QueueError> {
        self.letters.lock().push(DeadLetter {
            payload: payload.to_vec(),
            reason: reason.to_string(),
        });
        Ok(())
    }
}
