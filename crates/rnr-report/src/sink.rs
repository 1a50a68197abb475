use async_trait::async_trait;

use rnr_model::{LogRow, TaskId, TaskState};

use crate::error::ReportError;

/// Rows `index..index + rows.len()` of one task's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBatch {
    pub task_id: TaskId,
    pub index: u64,
    pub rows: Vec<LogRow>,
    /// Set on the final upload; no further rows will follow.
    pub no_more: bool,
}

/// Upstream receiver of sanitized logs and task results.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Upload a batch; returns the index up to which rows were persisted.
    async fn upload_logs(&self, batch: LogBatch) -> Result<u64, ReportError>;

    async fn update_state(&self, state: TaskState) -> Result<(), ReportError>;
}
