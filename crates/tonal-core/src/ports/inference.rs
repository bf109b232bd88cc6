//! InferenceEngine port - テキスト → ClassId
//!
//! 数値ランタイム（ONNX Runtime など）はこの trait の裏に隠します。

use crate::domain::errors::InferenceError;
use crate::domain::sentiment::ClassId;

/// InferenceEngine は texts を同じ長さ・同じ順序の ClassId 列に変換
///
/// # 契約
/// - `predict(texts).len() == texts.len()`、位置で対応
/// - 空の batch はモデルを呼ばずに空を返す
/// - 最大長を超えるテキストは truncate する（エラーにしない）
/// - モデル・語彙は起動時に一度だけロードし、以後 immutable
///
/// # Thread Safety
/// - 同期・CPU bound。呼び出し側は blocking pool で実行する
/// - ランタイムが reentrant でなければ実装側で lock する
pub trait InferenceEngine: Send + Sync {
    fn predict(&self, texts: &[String]) -> Result<Vec<ClassId>, InferenceError>;
}
