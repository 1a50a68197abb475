use async_trait::async_trait;
use thiserror::Error;

use rnr_model::{FetchedTask, TasksVersion};

/// Where tasks come from.
///
/// Implementations are called concurrently by every poll worker.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Ask for the next task, passing the last version this runner has seen.
    async fn fetch_task(&self, tasks_version: TasksVersion) -> Result<FetchedTask, FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// Treated by the poller as "no task", never as a failure.
    #[error("fetch deadline exceeded")]
    DeadlineExceeded,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("orchestrator rejected fetch: {0}")]
    Rejected(String),
}
