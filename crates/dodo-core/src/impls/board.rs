//! TaskStore の実装（タスクボード）
//!
//! ボードはステージごとのレコード列。行番号 = 列内のインデックス。

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::json_file;
use crate::domain::{RowRef, Stage, StoreError, TaskRecord};
use crate::ports::{RecordTransform, TaskStore};

/// Board contents, also the on-disk layout of [`FileTaskBoard`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardData {
    #[serde(default)]
    pub pending: Vec<TaskRecord>,
    #[serde(default)]
    pub in_progress: Vec<TaskRecord>,
    #[serde(default)]
    pub done: Vec<TaskRecord>,
}

impl BoardData {
    pub fn stage(&self, stage: Stage) -> &[TaskRecord] {
        match stage {
            Stage::Pending => &self.pending,
            Stage::InProgress => &self.in_progress,
            Stage::Done => &self.done,
        }
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut Vec<TaskRecord> {
        match stage {
            Stage::Pending => &mut self.pending,
            Stage::InProgress => &mut self.in_progress,
            Stage::Done => &mut self.done,
        }
    }

    fn append(&mut self, stage: Stage, record: TaskRecord) {
        self.stage_mut(stage).push(record);
    }

    fn relocate(
        &mut self,
        from: Stage,
        row: RowRef,
        to: Stage,
        transform: RecordTransform,
    ) -> Result<RowRef, StoreError> {
        let rows = self.stage_mut(from);
        if row.index() >= rows.len() {
            return Err(StoreError::NotFound(format!("row {row} of stage {from}")));
        }
        let record = transform(rows.remove(row.index()));
        let target = self.stage_mut(to);
        target.push(record);
        Ok(RowRef::new(target.len() - 1))
    }

    fn get(&self, stage: Stage, row: RowRef) -> Option<TaskRecord> {
        self.stage(stage).get(row.index()).cloned()
    }
}

/// InMemoryTaskBoard はテスト用
#[derive(Default)]
pub struct InMemoryTaskBoard {
    data: Mutex<BoardData>,
}

impl InMemoryTaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> BoardData {
        self.data.lock().await.clone()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskBoard {
    async fn append_record(&self, stage: Stage, record: TaskRecord) -> Result<(), StoreError> {
        self.data.lock().await.append(stage, record);
        Ok(())
    }

    async fn move_record(
        &self,
        from: Stage,
        row: RowRef,
        to: Stage,
        transform: RecordTransform,
    ) -> Result<RowRef, StoreError> {
        self.data.lock().await.relocate(from, row, to, transform)
    }

    async fn get_record(
        &self,
        stage: Stage,
        row: RowRef,
    ) -> Result<Option<TaskRecord>, StoreError> {
        Ok(self.data.lock().await.get(stage, row))
    }

    async fn list_stage(&self, stage: Stage) -> Result<Vec<TaskRecord>, StoreError> {
        Ok(self.data.lock().await.stage(stage).to_vec())
    }
}

/// FileTaskBoard は JSON ファイル 1 つにボード全体を保存
///
/// 移動は「読む → 取り出し・追記 → 書く」を 1 回の書き込みで行うので、
/// レコードが両方のステージに存在する状態はファイル上に現れない。
pub struct FileTaskBoard {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTaskBoard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl TaskStore for FileTaskBoard {
    async fn append_record(&self, stage: Stage, record: TaskRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut data: BoardData = json_file::load(&self.path).await?;
        data.append(stage, record);
        json_file::save(&self.path, &data).await
    }

    async fn move_record(
        &self,
        from: Stage,
        row: RowRef,
        to: Stage,
        transform: RecordTransform,
    ) -> Result<RowRef, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data: BoardData = json_file::load(&self.path).await?;
        let new_row = data.relocate(from, row, to, transform)?;
        json_file::save(&self.path, &data).await?;
        Ok(new_row)
    }

    async fn get_record(
        &self,
        stage: Stage,
        row: RowRef,
    ) -> Result<Option<TaskRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let data: BoardData = json_file::load(&self.path).await?;
        Ok(data.get(stage, row))
    }

    async fn list_stage(&self, stage: Stage) -> Result<Vec<TaskRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let data: BoardData = json_file::load(&self.path).await?;
        Ok(data.stage(stage).to_vec())
    }
}
