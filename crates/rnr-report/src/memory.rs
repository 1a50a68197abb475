//! In-memory [`ReportSink`] for tests.
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use rnr_model::TaskState;

use crate::error::ReportError;
use crate::sink::{LogBatch, ReportSink};

#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<LogBatch>>,
    lines: Mutex<Vec<String>>,
    states: Mutex<Vec<TaskState>>,
    /// Number of upcoming uploads to fail.
    fail_uploads: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_uploads(&self, n: usize) {
        self.fail_uploads.store(n, Ordering::SeqCst);
    }

    /// Persisted log contents, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<LogBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<TaskState> {
        self.states.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn upload_logs(&self, batch: LogBatch) -> Result<u64, ReportError> {
        let pending = self.fail_uploads.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_uploads.store(pending - 1, Ordering::SeqCst);
            return Err(ReportError::Upload("injected failure".into()));
        }

        let mut lines = self.lines.lock().unwrap();
        let have = lines.len() as u64;
        if batch.index > have {
            return Err(ReportError::Upload(format!(
                "gap: got index {} with {} rows stored",
                batch.index, have
            )));
        }
        let skip = (have - batch.index) as usize;
        lines.extend(batch.rows.iter().skip(skip).map(|r| r.content.clone()));
        let ack = lines.len() as u64;
        drop(lines);

        self.batches.lock().unwrap().push(batch);
        Ok(ack)
    }

    async fn update_state(&self, state: TaskState) -> Result<(), ReportError> {
        self.states.lock().unwrap().push(state);
        Ok(())
    }
}
