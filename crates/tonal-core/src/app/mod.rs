//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **TaskServiceBuilder**: TaskService の構築とワイヤリング
//! - **TaskService**: 受信 → 分類 → 保存 → ack のループ
//! - **StartupError / WorkerError**: プロセスを止めるエラーと終了コード

pub mod builder;
pub mod error;
pub mod task_service;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, TaskServiceBuilder};
pub use self::error::{StartupError, TaskFailure, WorkerError};
pub use self::task_service::TaskService;
