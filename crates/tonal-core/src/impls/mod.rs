//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskQueue / InMemoryResultStore / InMemoryDeadLetter**: 開発・テスト用
//! - **LexiconEngine**: 辞書ベースの InferenceEngine（モデルなしで動かす用）
//!
//! # 本番用実装（cargo feature）
//! - `amqp`: AmqpTaskQueue, AmqpDeadLetter（RabbitMQ）
//! - `redis`: RedisResultStore
//! - `onnx`: OnnxSentimentEngine（ONNX Runtime + tokenizers）

pub mod inmem_dead_letter;
pub mod inmem_delivery;
pub mod inmem_store;
pub mod lexicon;

#[cfg(feature = "amqp")]
pub mod amqp_queue;
#[cfg(feature = "onnx")]
pub mod onnx_engine;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use self::inmem_dead_letter::{DeadLetter, InMemoryDeadLetter};
pub use self::inmem_delivery::InMemoryTaskQueue;
pub use self::inmem_store::InMemoryResultStore;
pub use self::lexicon::LexiconEngine;

#[cfg(feature = "amqp")]
pub use self::amqp_queue::{AmqpDeadLetter, AmqpTaskQueue};
#[cfg(feature = "onnx")]
pub use self::onnx_engine::OnnxSentimentEngine;
#[cfg(feature = "redis")]
pub use self::redis_store::RedisResultStore;
