//! OnnxSentimentEngine - ONNX Runtime + HuggingFace tokenizer の InferenceEngine
//!
//! # 実装詳細
//! - 起動時に model / tokenizer を一度だけロード（以後 immutable）
//! - tokenizer 側で `max_length` に truncate、batch 内の最長に padding
//! - 入力は `input_ids` / `attention_mask`（i64, shape = [batch, seq]）
//! - 最初の出力を logits（f32, shape = [batch, num_labels]）として行ごとに argmax
//!
//! `Session::run` は `&mut` を要求するので、session は Mutex の中に置きます。

use std::path::Path;

use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::domain::errors::InferenceError;
use crate::domain::sentiment::ClassId;
use crate::ports::InferenceEngine;

pub struct OnnxSentimentEngine {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxSentimentEngine {
    /// Load the model and tokenizer. Any failure here is a startup failure.
    pub fn load(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        max_length: usize,
    ) -> Result<Self, InferenceError> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            InferenceError::Tokenizer(format!("{}: {e}", tokenizer_path.display()))
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| InferenceError::Tokenizer(format!("truncation: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        let session = Session::builder()
            .map_err(|e| InferenceError::Model(format!("ONNX builder: {e}")))?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| InferenceError::Model(format!("ONNX providers: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::Model(format!("{}: {e}", model_path.display())))?;

        info!(
            model = %model_path.display(),
            tokenizer = %tokenizer_path.display(),
            max_length,
            "loaded sentiment model"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, texts: &[String]) -> Result<(Array2<i64>, Array2<i64>), InferenceError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            ids.extend(encoding.get_ids().iter().map(|&id| i64::from(id)));
            mask.extend(encoding.get_attention_mask().iter().map(|&m| i64::from(m)));
        }

        let ids = Array2::from_shape_vec((batch, seq_len), ids)
            .map_err(|e| InferenceError::Tokenizer(format!("input_ids shape: {e}")))?;
        let mask = Array2::from_shape_vec((batch, seq_len), mask)
            .map_err(|e| InferenceError::Tokenizer(format!("attention_mask shape: {e}")))?;
        Ok((ids, mask))
    }
}

impl InferenceEngine for OnnxSentimentEngine {
    fn predict(&self, texts: &[String]) -> Result<Vec<ClassId>, InferenceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (ids, mask) = self.encode(texts)?;
        let input_ids =
            Tensor::from_array(ids).map_err(|e| InferenceError::Model(format!("input_ids: {e}")))?;
        let attention_mask = Tensor::from_array(mask)
            .map_err(|e| InferenceError::Model(format!("attention_mask: {e}")))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids.into_dyn(),
                "attention_mask" => attention_mask.into_dyn(),
            ])
            .map_err(|e| InferenceError::Model(format!("ONNX run: {e}")))?;

        let logits = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| InferenceError::Model("model produced no output".to_string()))?;
        let (_, logits) = logits
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Model(format!("logits: {e}")))?;

        let classes = argmax_rows(logits, texts.len())?;
        debug!(batch = texts.len(), "classified batch");
        Ok(classes)
    }
}

/// Row-wise argmax over a flat `[batch, num_labels]` logits buffer.
fn argmax_rows(logits: &[f32], batch: usize) -> Result<Vec<ClassId>, InferenceError> {
    if batch == 0 || logits.is_empty() || logits.len() % batch != 0 {
        return Err(InferenceError::Model(format!(
            "logits of length {} do not split into {batch} rows",
            logits.len()
        )));
    }
    let num_labels = logits.len() / batch;

    logits
        .chunks(num_labels)
        .map(|row| {
            let best = row
                .iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                    if v > best.1 { (i, v) } else { best }
                })
                .0;
            ClassId::try_from(best).map_err(InferenceError::from)
        })
        .collect()
}
