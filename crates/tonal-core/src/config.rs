//! Config - 環境変数からの設定読み込み
//!
//! # 設計原則
//! - 環境変数は `Env` trait 越しに読む（テストでは map を差し込む）
//! - 空文字列は未設定と同じ扱い
//! - 数値が読めない / 0 はエラー（黙って既定値に戻さない）

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ids::WorkerIdentity;

pub const RABBITMQ_URL: &str = "RABBITMQ_URL";
pub const RABBITMQ_TASK_QUEUE: &str = "RABBITMQ_TASK_QUEUE";
pub const REDIS_URL: &str = "REDIS_URL";
pub const WORKER_ID: &str = "WORKER_ID";
pub const MODEL_PATH: &str = "MODEL_PATH";
pub const TOKENIZER_PATH: &str = "TOKENIZER_PATH";
pub const MAX_SEQUENCE_LENGTH: &str = "MAX_SEQUENCE_LENGTH";
pub const PREFETCH_COUNT: &str = "PREFETCH_COUNT";
pub const DEAD_LETTER_QUEUE: &str = "DEAD_LETTER_QUEUE";

const DEFAULT_MODEL_PATH: &str = "model.onnx";
const DEFAULT_TOKENIZER_PATH: &str = "tokenizer.json";
const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 128;
const DEFAULT_PREFETCH_COUNT: u16 = 1;

/// 環境変数へのアクセスを抽象化（テスト分離用）
pub trait Env: Send + Sync {
    fn var(&self, key: &str) -> Result<String, std::env::VarError>;
}

/// 実際のプロセス環境変数
pub struct RealEnv;

impl Env for RealEnv {
    fn var(&self, key: &str) -> Result<String, std::env::VarError> {
        std::env::var(key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} has invalid value {value:?} (expected a positive integer)")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub rabbitmq_url: String,
    pub task_queue: String,
    pub redis_url: String,
    pub identity: WorkerIdentity,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_sequence_length: usize,
    pub prefetch_count: u16,
    pub dead_letter_queue: Option<String>,
}

impl WorkerConfig {
    pub fn from_env(env: &dyn Env) -> Result<Self, ConfigError> {
        Ok(Self {
            rabbitmq_url: required(env, RABBITMQ_URL)?,
            task_queue: required(env, RABBITMQ_TASK_QUEUE)?,
            redis_url: required(env, REDIS_URL)?,
            identity: optional(env, WORKER_ID)
                .map(WorkerIdentity::new)
                .unwrap_or_else(WorkerIdentity::from_pid),
            model_path: optional(env, MODEL_PATH)
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            tokenizer_path: optional(env, TOKENIZER_PATH)
                .unwrap_or_else(|| DEFAULT_TOKENIZER_PATH.to_string())
                .into(),
            max_sequence_length: positive(env, MAX_SEQUENCE_LENGTH, DEFAULT_MAX_SEQUENCE_LENGTH)?,
            prefetch_count: positive(env, PREFETCH_COUNT, DEFAULT_PREFETCH_COUNT)?,
            dead_letter_queue: optional(env, DEAD_LETTER_QUEUE),
        })
    }
}

fn optional(env: &dyn Env, var: &str) -> Option<String> {
    env.var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required(env: &dyn Env, var: &'static str) -> Result<String, ConfigError> {
    optional(env, var).ok_or(ConfigError::Missing(var))
}

fn positive<T>(env: &dyn Env, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let Some(raw) = optional(env, var) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v != T::default() => Ok(v),
        _ => Err(ConfigError::Invalid { var, value: raw }),
    }
}
