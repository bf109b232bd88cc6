//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（RabbitMQ, Redis, ONNX Runtime）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod dead_letter;
pub mod inference;
pub mod result_store;
pub mod task_queue;

pub use self::dead_letter::{DeadLetterSink, NoopDeadLetter};
pub use self::inference::InferenceEngine;
pub use self::result_store::ResultStore;
pub use self::task_queue::{Delivery, DeliveryStream, TaskQueue};
