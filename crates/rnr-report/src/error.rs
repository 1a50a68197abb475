use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("log stream already closed")]
    Closed,
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("acknowledged index {ack} is behind submitted index {index}; logs were lost")]
    AckBehind { ack: u64, index: u64 },
    #[error("{remaining} log rows were not acknowledged before close")]
    Incomplete { remaining: usize },
}
