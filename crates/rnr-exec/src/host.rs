use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use rnr_core::{JobError, JobExecutor};
use rnr_model::{Task, TaskResult, TaskState};
use rnr_report::{LogWriter, ReportSink, Reporter};

use crate::config::ExecConfig;
use crate::error::{ExecError, ExecResult};
use crate::limits::attach_rlimits;
use crate::output::{merged_pipe, spawn_pump};
use crate::util::kill_graceful;

/// Environment variable carrying the task id into the job.
pub const TASK_ID_ENV: &str = "RNR_TASK_ID";
/// Environment variable carrying the target repository into the job.
pub const REPOSITORY_ENV: &str = "RNR_REPOSITORY";

/// Runs each task as a child process on the host.
///
/// The task is written to the child's stdin as JSON. stdout and stderr share
/// one pipe whose lines go through a per-job [`Reporter`]; the final
/// [`TaskState`] is sent once the log stream is closed. The task's working
/// directory is removed afterwards.
pub struct HostExecutor {
    cfg: ExecConfig,
    sink: Arc<dyn ReportSink>,
}

impl HostExecutor {
    pub fn new(cfg: ExecConfig, sink: Arc<dyn ReportSink>) -> Self {
        Self { cfg, sink }
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        task: &Task,
        workdir: &Path,
        writer: &LogWriter,
    ) -> ExecResult<()> {
        tokio::fs::create_dir_all(workdir).await?;

        let (output, stdout, stderr) = merged_pipe()?;
        let mut cmd = self.cfg.command()?;
        cmd.current_dir(workdir)
            .envs(self.cfg.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env(TASK_ID_ENV, task.id.to_string())
            .env(REPOSITORY_ENV, task.repository())
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);
        attach_rlimits(&mut cmd, &self.cfg.rlimits);

        trace!(command = %self.cfg.describe(), workdir = %workdir.display(), "spawn");
        let mut child = cmd.spawn().map_err(|e| ExecError::Spawn(e.to_string()))?;
        // The parent's copies of the write end must close for EOF to arrive.
        drop(cmd);
        let pump = spawn_pump(output, writer.clone())?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(task)?;
            tokio::spawn(async move {
                // The job may exit without reading its input.
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!(error = %e, "task payload not consumed");
                }
            });
        }

        let outcome = tokio::select! {
            status = child.wait() => Ok(status?),
            _ = cancel.cancelled() => Err(ExecError::Cancelled),
            _ = tokio::time::sleep(self.cfg.timeout) => Err(ExecError::TimedOut(self.cfg.timeout)),
        };
        let status = match outcome {
            Ok(status) => status,
            Err(e) => {
                info!(reason = %e, "stopping job process");
                if let Err(e) = kill_graceful(&mut child, self.cfg.kill_grace).await {
                    warn!(error = %e, "failed to stop job process");
                }
                drain(pump, self.cfg.kill_grace).await;
                return Err(e);
            }
        };
        drain(pump, self.cfg.kill_grace).await;

        if status.success() || !self.cfg.fail_on_non_zero {
            debug!(?status, "job process exited");
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(ExecError::NonZeroExit { code }),
            None => Err(ExecError::KilledBySignal),
        }
    }
}

#[async_trait]
impl JobExecutor for HostExecutor {
    async fn run(&self, cancel: CancellationToken, task: Task) -> Result<(), JobError> {
        let started_at = OffsetDateTime::now_utc();
        let reporter = Reporter::new(&task, Arc::clone(&self.sink), self.cfg.reporter.clone());
        let (writer, uploads) = reporter.spawn();
        let workdir = self.cfg.workdir_parent.join(task.id.to_string());

        let outcome = self.execute(&cancel, &task, &workdir, &writer).await;
        if let Err(e) = &outcome {
            let _ = writer.write_line(format!("job failed: {e}")).await;
        }
        drop(writer);

        match uploads.await {
            Ok(Ok(rows)) => debug!(rows, "logs uploaded"),
            Ok(Err(e)) => warn!(error = %e, "log upload incomplete"),
            Err(e) => warn!(error = %e, "log reporter aborted"),
        }
        remove_workdir(&workdir).await;

        let result = match &outcome {
            Ok(()) => TaskResult::Success,
            Err(ExecError::Cancelled) => TaskResult::Cancelled,
            Err(_) => TaskResult::Failure,
        };
        let state = TaskState {
            id: task.id,
            result,
            started_at: Some(started_at),
            stopped_at: Some(OffsetDateTime::now_utc()),
        };
        self.sink
            .update_state(state)
            .await
            .map_err(|e| JobError::Report(e.to_string()))?;
        info!(result = result.as_str(), "task reported");

        outcome.map_err(JobError::from)
    }
}

/// Wait for the output reader to hit EOF. Descendants of the job may still
/// hold the pipe open, so the reader is abandoned after `within`.
async fn drain(mut pump: JoinHandle<()>, within: Duration) {
    if tokio::time::timeout(within, &mut pump).await.is_err() {
        warn!("job output still open after exit; dropping remaining output");
        pump.abort();
    }
}

async fn remove_workdir(workdir: &Path) {
    match tokio::fs::remove_dir_all(workdir).await {
        Ok(()) => debug!(workdir = %workdir.display(), "workdir removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(workdir = %workdir.display(), error = %e, "failed to remove workdir"),
    }
}
