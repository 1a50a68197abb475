use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use rnr_model::Task;

/// Runs one admitted task to completion.
///
/// `cancel` fires when the runner is forcing shutdown; implementations must
/// stop promptly and still report what they can.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn run(&self, cancel: CancellationToken, task: Task) -> Result<(), JobError>;
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job cancelled")]
    Cancelled,
    #[error("job timed out after {0:?}")]
    TimedOut(Duration),
    #[error("job failed: {0}")]
    Failed(String),
    #[error("failed to report job: {0}")]
    Report(String),
}
