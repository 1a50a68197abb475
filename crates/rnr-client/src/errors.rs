use thiserror::Error;

use rnr_core::FetchError;
use rnr_report::ReportError;

/// Connect code for an RPC the server does not implement.
pub const CODE_UNIMPLEMENTED: &str = "unimplemented";
/// Connect code for a call that ran out of time.
pub const CODE_DEADLINE_EXCEEDED: &str = "deadline_exceeded";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("rpc failed [{code}]: {message}")]
    Rpc { code: String, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Connect error code, when the server sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Rpc { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_unimplemented(&self) -> bool {
        self.code() == Some(CODE_UNIMPLEMENTED)
    }

    fn is_deadline(&self) -> bool {
        match self {
            ClientError::HttpRequest(e) => e.is_timeout(),
            other => other.code() == Some(CODE_DEADLINE_EXCEEDED),
        }
    }
}

impl From<ClientError> for FetchError {
    fn from(e: ClientError) -> Self {
        if e.is_deadline() {
            return FetchError::DeadlineExceeded;
        }
        match e {
            ClientError::Rpc { .. } => FetchError::Rejected(e.to_string()),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

impl From<ClientError> for ReportError {
    fn from(e: ClientError) -> Self {
        ReportError::Upload(e.to_string())
    }
}
