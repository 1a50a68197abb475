//! Per-job log processing and upload.
//!
//! Raw output lines go through a [`LogCommandProcessor`], which interprets
//! workflow commands (`::add-mask::`, `::debug::`, `::stop-commands::`) and
//! redacts secrets, then a [`Reporter`] batches the surviving rows to a
//! [`ReportSink`].

mod command;
pub use command::{Command, parse_command};

mod error;
pub use error::ReportError;

mod mask;
pub use mask::{MASK, Masker};

mod processor;
pub use processor::{CommandState, LogCommandProcessor};

mod reporter;
pub use reporter::{LogWriter, Reporter, ReporterConfig};

mod sink;
pub use sink::{LogBatch, ReportSink};

#[cfg(any(test, feature = "testing"))]
pub mod memory;
