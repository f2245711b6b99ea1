//! Errors - エラー型と分類
//!
//! - `CompletionError`: 生成サービスの失敗（呼び出し側で "結果なし" に縮退）
//! - `StoreError`: 外部ストアの失敗
//! - `TransitionError`: タスクのステージ遷移の失敗（呼び出し側へ必ず返す）

use serde::Serialize;
use thiserror::Error;

use super::state::Stage;
use super::task::RowRef;

/// Failure of one call to the text-completion service.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum CompletionError {
    /// Transport failure or a non-2xx answer.
    #[error("completion service unreachable: {0}")]
    Unreachable(String),

    /// The service answered but there was no candidate text.
    #[error("completion service returned no candidate text")]
    EmptyResponse,

    /// Candidate text did not contain recoverable JSON.
    #[error("completion text is not valid JSON even after repair")]
    MalformedJson { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing data exists but could not be read or decoded.
    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("write failed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("no task record at row {row} of stage {stage}")]
    RecordNotFound { stage: Stage, row: RowRef },

    #[error("task store failed during transition: {0}")]
    Store(StoreError),
}

impl From<StoreError> for TransitionError {
    fn from(err: StoreError) -> Self {
        TransitionError::Store(err)
    }
}
