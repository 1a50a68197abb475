pub mod admission;
pub use admission::{AllowList, Rejection, match_allowed_repo};

pub mod error;
pub use error::CoreError;

pub mod executor;
pub use executor::{JobError, JobExecutor};

pub mod limiter;
pub use limiter::{LimiterError, RateLimiter};

pub mod poller;
pub use poller::{Poller, PollerConfig, PollerState};

pub mod source;
pub use source::{FetchError, TaskSource};
