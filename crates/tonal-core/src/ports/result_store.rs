//! ResultStore port - 結果の保存先（Redis または InMemory）
//!
//! key は task id をそのまま使います。

use async_trait::async_trait;

use crate::domain::errors::StoreError;
use crate::domain::task::Task;

/// ResultStore は分類済み Task を task id で保存
///
/// # 設計原則
/// - last-writer-wins: 同じ id への put は前の値を完全に置き換える（merge しない）
/// - タスク間のトランザクションは不要
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn put(&self, id: &str, task: &Task) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError>;
}
