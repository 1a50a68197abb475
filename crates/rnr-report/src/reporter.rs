use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument, warn};

use rnr_model::{LogRow, Task, TaskId};

use crate::error::ReportError;
use crate::processor::LogCommandProcessor;
use crate::sink::{LogBatch, ReportSink};

#[derive(Clone, Debug)]
pub struct ReporterConfig {
    /// How often buffered rows are uploaded.
    pub flush_interval: Duration,
    /// Extra attempts for the final upload.
    pub close_retries: usize,
    pub retry_delay: Duration,
    /// Show `::debug::` lines even when the job did not ask for them.
    pub debug_output: bool,
    pub channel_capacity: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(1),
            close_retries: 5,
            retry_delay: Duration::from_millis(500),
            debug_output: false,
            channel_capacity: 1024,
        }
    }
}

/// Producer side of a job's log stream. Dropping every clone closes the stream.
#[derive(Clone, Debug)]
pub struct LogWriter {
    tx: mpsc::Sender<String>,
}

impl LogWriter {
    pub async fn write_line(&self, line: impl Into<String>) -> Result<(), ReportError> {
        self.tx
            .send(line.into())
            .await
            .map_err(|_| ReportError::Closed)
    }
}

/// Owns one job's [`LogCommandProcessor`] and uploads what it lets through.
///
/// Lines arrive over a single channel and are processed by one task, so
/// mask and suppression state never need locking.
pub struct Reporter {
    task_id: TaskId,
    processor: LogCommandProcessor,
    sink: Arc<dyn ReportSink>,
    cfg: ReporterConfig,
    rows: Vec<LogRow>,
    // Log index of `rows[0]`.
    offset: u64,
}

impl Reporter {
    pub fn new(task: &Task, sink: Arc<dyn ReportSink>, cfg: ReporterConfig) -> Self {
        let processor = LogCommandProcessor::new(cfg.debug_output || task.step_debug())
            .with_secrets(task.secrets.values());
        Self {
            task_id: task.id,
            processor,
            sink,
            cfg,
            rows: Vec::new(),
            offset: 0,
        }
    }

    /// Start the upload loop. It ends once every [`LogWriter`] is dropped and
    /// resolves to the number of rows acknowledged upstream.
    pub fn spawn(self) -> (LogWriter, JoinHandle<Result<u64, ReportError>>) {
        let (tx, rx) = mpsc::channel(self.cfg.channel_capacity.max(1));
        let handle = tokio::spawn(self.run(rx));
        (LogWriter { tx }, handle)
    }

    #[instrument(level = "debug", skip_all, fields(task_id = self.task_id))]
    async fn run(mut self, mut rx: mpsc::Receiver<String>) -> Result<u64, ReportError> {
        let mut ticker = tokio::time::interval(self.cfg.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                line = rx.recv() => match line {
                    Some(line) => self.push(&line),
                    None => break,
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.flush(false).await {
                        warn!(error = %e, pending = self.rows.len(), "log upload failed; will retry");
                    }
                }
            }
        }

        self.close().await
    }

    fn push(&mut self, raw: &str) {
        if let Some(content) = self.processor.process_line(raw) {
            self.rows.push(LogRow::now(content));
        }
    }

    async fn flush(&mut self, no_more: bool) -> Result<(), ReportError> {
        if self.rows.is_empty() && !no_more {
            return Ok(());
        }
        let batch = LogBatch {
            task_id: self.task_id,
            index: self.offset,
            rows: self.rows.clone(),
            no_more,
        };
        let ack = self.sink.upload_logs(batch).await?;
        self.acknowledge(ack)
    }

    fn acknowledge(&mut self, ack: u64) -> Result<(), ReportError> {
        if ack < self.offset {
            return Err(ReportError::AckBehind {
                ack,
                index: self.offset,
            });
        }
        let n = ((ack - self.offset) as usize).min(self.rows.len());
        self.rows.drain(..n);
        self.offset += n as u64;
        Ok(())
    }

    async fn close(mut self) -> Result<u64, ReportError> {
        let mut attempt = 0;
        loop {
            match self.flush(true).await {
                Ok(()) if self.rows.is_empty() => {
                    debug!(rows = self.offset, "log stream closed");
                    return Ok(self.offset);
                }
                Ok(()) => warn!(pending = self.rows.len(), "not all logs acknowledged"),
                Err(e) => warn!(error = %e, attempt, "final log upload failed"),
            }
            attempt += 1;
            if attempt > self.cfg.close_retries {
                return Err(ReportError::Incomplete {
                    remaining: self.rows.len(),
                });
            }
            tokio::time::sleep(self.cfg.retry_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySink;

    fn cfg() -> ReporterConfig {
        ReporterConfig {
            flush_interval: Duration::from_millis(20),
            close_retries: 2,
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn task_with_secret(id: TaskId, secret: &str) -> Task {
        let mut task = Task {
            id,
            ..Default::default()
        };
        task.secrets.insert("TOKEN".into(), secret.into());
        task
    }

    #[tokio::test]
    async fn forwards_sanitized_lines_in_order() {
        let sink = Arc::new(MemorySink::new());
        let reporter = Reporter::new(&task_with_secret(1, "s3cr3t"), sink.clone(), cfg());
        let (writer, handle) = reporter.spawn();

        for line in [
            "token is s3cr3t",
            "::add-mask::later",
            "later on",
            "::debug::hidden",
            "done",
        ] {
            writer.write_line(line).await.unwrap();
        }
        drop(writer);

        assert_eq!(handle.await.unwrap().unwrap(), 3);
        assert_eq!(sink.lines(), vec!["token is ***", "*** on", "done"]);
        let last = sink.batches().pop().unwrap();
        assert!(last.no_more);
    }

    #[tokio::test]
    async fn step_debug_secret_enables_debug_lines() {
        let sink = Arc::new(MemorySink::new());
        let mut task = Task::default();
        task.secrets
            .insert(rnr_model::STEP_DEBUG_KEY.into(), "true".into());
        let (writer, handle) = Reporter::new(&task, sink.clone(), cfg()).spawn();

        writer.write_line("::debug::visible").await.unwrap();
        drop(writer);

        handle.await.unwrap().unwrap();
        assert_eq!(sink.lines(), vec!["visible"]);
    }

    #[tokio::test]
    async fn periodic_flush_uploads_before_close() {
        let sink = Arc::new(MemorySink::new());
        let (writer, handle) = Reporter::new(&Task::default(), sink.clone(), cfg()).spawn();

        writer.write_line("first").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.lines(), vec!["first"]);

        writer.write_line("second").await.unwrap();
        drop(writer);
        handle.await.unwrap().unwrap();

        let batches = sink.batches();
        assert!(!batches[0].no_more);
        assert!(batches.last().unwrap().no_more);
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failed_uploads_are_retried_on_close() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next_uploads(2);
        let (writer, handle) = Reporter::new(&Task::default(), sink.clone(), cfg()).spawn();

        writer.write_line("kept").await.unwrap();
        drop(writer);

        assert_eq!(handle.await.unwrap().unwrap(), 1);
        assert_eq!(sink.lines(), vec!["kept"]);
    }

    #[tokio::test]
    async fn close_gives_up_after_retries() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next_uploads(100);
        let (writer, handle) = Reporter::new(&Task::default(), sink.clone(), cfg()).spawn();

        writer.write_line("lost").await.unwrap();
        drop(writer);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, ReportError::Incomplete { remaining: 1 }));
    }

    #[test]
    fn ack_behind_offset_is_an_error() {
        let sink = Arc::new(MemorySink::new());
        let mut reporter = Reporter::new(&Task::default(), sink, cfg());
        reporter.rows = vec![LogRow::now("a"), LogRow::now("b")];
        reporter.offset = 5;

        assert!(matches!(
            reporter.acknowledge(4),
            Err(ReportError::AckBehind { ack: 4, index: 5 })
        ));
        reporter.acknowledge(6).unwrap();
        assert_eq!(reporter.offset, 6);
        assert_eq!(reporter.rows.len(), 1);
    }
}
