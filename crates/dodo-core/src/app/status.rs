//! Status - ボードの状態表示
//!
//! ステージごとの件数と中身をまとめて返す（CLI の `board` 用）。

use serde::Serialize;

use crate::domain::{Stage, StoreError, TaskRecord};
use crate::ports::TaskStore;

/// ステージごとの件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoardStatus {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl BoardStatus {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.done
    }
}

/// ボード全体のスナップショット
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardView {
    pub status: BoardStatus,
    pub pending: Vec<TaskRecord>,
    pub in_progress: Vec<TaskRecord>,
    pub done: Vec<TaskRecord>,
}

impl BoardView {
    pub async fn load(tasks: &dyn TaskStore) -> Result<Self, StoreError> {
        let pending = tasks.list_stage(Stage::Pending).await?;
        let in_progress = tasks.list_stage(Stage::InProgress).await?;
        let done = tasks.list_stage(Stage::Done).await?;
        Ok(Self {
            status: BoardStatus {
                pending: pending.len(),
                in_progress: in_progress.len(),
                done: done.len(),
            },
            pending,
            in_progress,
            done,
        })
    }

    pub fn stage(&self, stage: Stage) -> &[TaskRecord] {
        match stage {
            Stage::Pending => &self.pending,
            Stage::InProgress => &self.in_progress,
            Stage::Done => &self.done,
        }
    }
}
