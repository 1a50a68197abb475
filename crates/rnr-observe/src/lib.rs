//! Logging setup for the runner daemon.
//!
//! Installs a global `tracing` subscriber in one of three output formats,
//! filtered by an `EnvFilter` directive string.

mod logger;
pub use logger::*;
