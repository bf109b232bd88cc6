//! InMemoryResultStore - 開発用の結果ストア
//!
//! Redis と同じく、encode 済みの record（bytes）を key ごとに 1 つ保持します。

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::codec;
use crate::domain::errors::StoreError;
use crate::domain::task::Task;
use crate::ports::ResultStore;

#[derive(Default)]
pub struct InMemoryResultStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されている生の record（テスト・デバッグ用）
    pub fn raw(&self, id: &str) -> Option<Vec<u8>> {
        self.records.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn put(&self, id: &str, task: &Task) -> Result<(), StoreError> {
        let record = codec::encode(task)?;
        self.records.write().insert(id.to_string(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let Some(record) = self.raw(id) else {
            return Ok(None);
        };
        codec::decode(&record)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: id.to_string(),
                reason: e.reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassId, Message};

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryResultStore::new();
        let task = Task::new("t1", vec![Message::new("x")])
            .annotate(vec![ClassId::Positive])
            .unwrap();

        store.put("t1", &task).await.unwrap();

        assert_eq!(store.get("t1").await.unwrap(), Some(task));
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_put_replaces_first_entirely() {
        let store = InMemoryResultStore::new();
        let first = Task::new("t1", vec![Message::new("a"), Message::new("b")]);
        let second = Task::new("t1", vec![Message::new("c")]);

        store.put("t1", &first).await.unwrap();
        store.put("t1", &second).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("t1").await.unwrap(), Some(second));
    }
}
