//! TaskStore port - タスクボード
//!
//! ステージ（pending / in-progress / done）ごとに並んだレコードの集合。
//! 行番号（RowRef）はステージ内の現在位置で、移動のたびにずれる。
//!
//! # 実装
//! - **InMemoryTaskBoard**: テスト用
//! - **FileTaskBoard**: JSON ファイル（CLI 用）

use async_trait::async_trait;

use crate::domain::{RowRef, Stage, StoreError, TaskRecord};

/// 移動時にレコードを書き換える関数
pub type RecordTransform = Box<dyn FnOnce(TaskRecord) -> TaskRecord + Send>;

/// TaskStore はタスクレコードの正本
///
/// # 設計原則
/// - レコードはその場で編集しない。移動 = 元ステージから削除 + 次ステージへ追記
/// - `move_record` は削除と追記を 1 回の書き込みで行う（片方だけ残らない）
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn append_record(&self, stage: Stage, record: TaskRecord) -> Result<(), StoreError>;

    /// `from` の `row` にあるレコードを取り出し、`transform` を通して `to` の末尾に追記
    ///
    /// 追記先の行番号を返す。行が無ければ `StoreError::NotFound`。
    async fn move_record(
        &self,
        from: Stage,
        row: RowRef,
        to: Stage,
        transform: RecordTransform,
    ) -> Result<RowRef, StoreError>;

    async fn get_record(&self, stage: Stage, row: RowRef)
    -> Result<Option<TaskRecord>, StoreError>;

    async fn list_stage(&self, stage: Stage) -> Result<Vec<TaskRecord>, StoreError>;
}
