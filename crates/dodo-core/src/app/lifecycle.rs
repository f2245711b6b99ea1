//! Task lifecycle - pending -> in-progress -> done.
//!
//! One completion signal moves one record one stage forward. Reaching done
//! may archive the source message; archival never blocks the move.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{RowRef, Stage, StoreError, TransitionError};
use crate::ports::{Clock, MessageStore, TaskStore};

/// Result of a successful [`TaskLifecycle::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Advanced {
    /// The record now sits at `row` of stage `to`.
    Moved { to: Stage, row: RowRef },

    /// The record was already done; nothing changed.
    AlreadyDone,
}

pub struct TaskLifecycle {
    pub(crate) tasks: Arc<dyn TaskStore>,
    pub(crate) messages: Arc<dyn MessageStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) auto_archive: bool,
}

impl TaskLifecycle {
    /// Moves the record at `row` of `stage` to the next stage.
    ///
    /// # Errors
    /// - `RecordNotFound` when `stage` has no record at `row` (stale row
    ///   reference). Done records are checked too.
    /// - `Store` when the task store fails to read or write.
    pub async fn advance(&self, stage: Stage, row: RowRef) -> Result<Advanced, TransitionError> {
        let record = self
            .tasks
            .get_record(stage, row)
            .await?
            .ok_or(TransitionError::RecordNotFound { stage, row })?;

        let Some(to) = stage.next() else {
            debug!(task_id = %record.id, "task already done");
            return Ok(Advanced::AlreadyDone);
        };

        let now = self.clock.now();
        let new_row = self
            .tasks
            .move_record(stage, row, to, Box::new(move |r| r.moved_to(to, now)))
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => TransitionError::RecordNotFound { stage, row },
                other => TransitionError::Store(other),
            })?;
        info!(task_id = %record.id, from = %stage, to = %to, row = %new_row, "task moved");

        if to.is_terminal() && self.auto_archive {
            match self.messages.archive_by_link(&record.source_link).await {
                Ok(()) => info!(task_id = %record.id, link = %record.source_link, "source message archived"),
                Err(err) => warn!(
                    task_id = %record.id,
                    link = %record.source_link,
                    error = %err,
                    "could not archive source message, task stays done"
                ),
            }
        }

        Ok(Advanced::Moved { to, row: new_row })
    }
}
