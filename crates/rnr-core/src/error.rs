use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("shutdown grace period of {0:?} exceeded; running jobs were cancelled")]
    ShutdownTimeout(Duration),
}
