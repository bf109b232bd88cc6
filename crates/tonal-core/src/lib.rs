//! tonal-core
//!
//! Building blocks for the sentiment worker: consume tasks from a queue,
//! classify every message, store the annotated task, acknowledge.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Task, ClassId, codec, TaskState, errors）
//! - **ports**: 抽象化レイヤー（TaskQueue, ResultStore, InferenceEngine, DeadLetterSink）
//! - **impls**: 実装（InMemory 系は常に、RabbitMQ / Redis / ONNX は cargo feature で）
//! - **app**: アプリケーションロジック（TaskService, TaskServiceBuilder）
//! - **config**: 環境変数からの WorkerConfig
//! - **observability**: ループのカウンタ（WorkerStats）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
