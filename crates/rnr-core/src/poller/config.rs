use std::time::Duration;

/// Tuning for the fetch/dispatch loop.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Number of concurrent workers; also the maximum number of running jobs.
    pub capacity: usize,
    /// Minimum global spacing between two fetch attempts.
    pub fetch_interval: Duration,
    /// Per-call deadline for a single fetch.
    pub fetch_timeout: Duration,
    /// `owner/name` patterns a task's repository must match.
    pub allowed_repos: Vec<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            capacity: 1,
            fetch_interval: Duration::from_secs(2),
            fetch_timeout: Duration::from_secs(5),
            allowed_repos: Vec::new(),
        }
    }
}
