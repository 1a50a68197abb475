//! Host process executor: runs one configured program per task and streams
//! its output through a per-job reporter.

mod config;
pub use config::ExecConfig;

mod error;
pub use error::{ExecError, ExecResult};

mod host;
mod output;
pub use host::{HostExecutor, REPOSITORY_ENV, TASK_ID_ENV};

pub mod limits;
pub use limits::RlimitConfig;

mod util;
