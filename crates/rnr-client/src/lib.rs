//! Connect-JSON client for the orchestrator's runner service.

mod client;
pub use client::RunnerClient;

mod config;
pub use config::ClientConfig;

mod errors;
pub use errors::ClientError;

pub mod proto;
