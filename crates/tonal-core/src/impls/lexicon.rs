//! LexiconEngine - 完全一致の辞書で分類する InferenceEngine
//!
//! モデルなしでパイプラインを動かすための実装です（ローカル実行・テスト用）。
//! 辞書にないテキストは `fallback`（既定は Neutral）になります。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::errors::InferenceError;
use crate::domain::sentiment::ClassId;
use crate::ports::InferenceEngine;

#[derive(Debug, Default)]
pub struct LexiconEngine {
    entries: HashMap<String, ClassId>,
    fallback: Option<ClassId>,
    batches: AtomicUsize,
}

impl LexiconEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, text: impl Into<String>, class: ClassId) -> Self {
        self.entries.insert(text.into(), class);
        self
    }

    pub fn with_fallback(mut self, class: ClassId) -> Self {
        self.fallback = Some(class);
        self
    }

    /// 実際に分類した batch 数（空 batch は数えない）
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }
}

impl InferenceEngine for LexiconEngine {
    fn predict(&self, texts: &[String]) -> Result<Vec<ClassId>, InferenceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.batches.fetch_add(1, Ordering::Relaxed);

        let fallback = self.fallback.unwrap_or(ClassId::Neutral);
        Ok(texts
            .iter()
            .map(|t| self.entries.get(t).copied().unwrap_or(fallback))
            .collect())
    }
}
