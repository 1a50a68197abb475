//! Domain and wire types shared by the runner crates.
//!
//! The types mirror the orchestrator's JSON encoding: camelCase field names,
//! 64-bit integers as strings, timestamps as RFC 3339.

mod error;
pub use error::ModelError;

mod task;
pub use task::{FetchedTask, Task, REPOSITORY_FIELD, STEP_DEBUG_KEY};

mod state;
pub use state::{TaskResult, TaskState};

mod log;
pub use log::LogRow;

mod label;
pub use label::{Label, LabelSchema, Labels};

mod registration;
pub use registration::Registration;

pub mod wire;

/// Identifier assigned to a task by the orchestrator.
pub type TaskId = i64;

/// Cache hint returned with every fetch; zero means "no hint".
pub type TasksVersion = i64;
