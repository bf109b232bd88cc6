//! RedisResultStore - Redis 上の ResultStore
//!
//! record は encode 済み JSON をそのまま string value として `SET <task id> <record>`。
//! TTL もインデックスも持たない（同じ id への put は単純に上書き）。
//!
//! # 接続
//! `MultiplexedConnection` は clone が安く、clone 同士で 1 本の接続を共有します。
//! 呼び出しごとに clone して `&mut` を得ます。

use ::redis::aio::MultiplexedConnection;
use ::redis::AsyncCommands;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::codec;
use crate::domain::errors::StoreError;
use crate::domain::task::Task;
use crate::ports::ResultStore;

pub struct RedisResultStore {
    conn: MultiplexedConnection,
}

impl RedisResultStore {
    /// Open a connection and verify it with `PING`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {e}")))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to connect to redis: {e}")))?;

        let pong: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(format!("redis PING failed: {e}")))?;
        info!(reply = %pong, "connected to redis");

        Ok(Self { conn })
    }

    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

/// 接続が切れた / 拒否された / IO エラーは ConnectionLost、それ以外はコマンド単位の失敗
fn map_redis_error(err: ::redis::RedisError, command: &str, key: &str) -> StoreError {
    if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
        StoreError::ConnectionLost(format!("{command} {key}: {err}"))
    } else {
        StoreError::Unavailable(format!("{command} {key} failed: {err}"))
    }
}

#[async_trait]
impl ResultStore for RedisResultStore {
    async fn put(&self, id: &str, task: &Task) -> Result<(), StoreError> {
        let record = codec::encode(task)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(id, record.as_slice())
            .await
            .map_err(|e| map_redis_error(e, "SET", id))?;
        debug!(task_id = %id, bytes = record.len(), "stored result");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let mut conn = self.conn.clone();
        let record: Option<Vec<u8>> = conn
            .get(id)
            .await
            .map_err(|e| map_redis_error(e, "GET", id))?;

        let Some(record) = record else {
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
    use std::io;

    #[test]
    fn io_failures_map_to_connection_lost() {
        let err = ::redis::RedisError::from(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));
        let mapped = map_redis_error(err, "SET", "t1");
        assert!(mapped.is_connection_lost(), "{mapped}");
        assert!(mapped.to_string().contains("SET t1"));
    }
}
