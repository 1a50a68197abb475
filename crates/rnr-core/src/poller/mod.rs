//! Concurrent fetch/dispatch engine.
//!
//! `capacity` workers share one [`RateLimiter`] and one tasks-version cache.
//! Shutdown is two-phase:
//!
//! 1. the *polling* token is cancelled, so idle workers leave their loops
//!    while running jobs continue;
//! 2. if the grace period runs out, the *jobs* token is cancelled and
//!    executors are expected to abort.
//!
//! A third token, *done*, fires once after every worker has returned.
mod config;
pub use config::PollerConfig;

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, instrument, trace, warn};

use rnr_model::{Task, TasksVersion};

use crate::{
    admission::AllowList,
    error::CoreError,
    executor::JobExecutor,
    limiter::RateLimiter,
    source::{FetchError, TaskSource},
};

/// Observable phase of the shutdown state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Running,
    GracefulStop,
    ForcedStop,
    Drained,
}

#[derive(Clone)]
pub struct Poller {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn TaskSource>,
    executor: Arc<dyn JobExecutor>,
    cfg: PollerConfig,
    allow: AllowList,
    tasks_version: AtomicI64,

    polling: CancellationToken,
    jobs: CancellationToken,
    done: CancellationToken,
}

impl Poller {
    pub fn new(
        cfg: PollerConfig,
        source: Arc<dyn TaskSource>,
        executor: Arc<dyn JobExecutor>,
    ) -> Self {
        let allow = AllowList::new(cfg.allowed_repos.clone());
        Self {
            inner: Arc::new(Inner {
                source,
                executor,
                cfg,
                allow,
                tasks_version: AtomicI64::new(0),
                polling: CancellationToken::new(),
                jobs: CancellationToken::new(),
                done: CancellationToken::new(),
            }),
        }
    }

    /// Run all workers until polling is stopped and every worker has exited.
    pub async fn poll(&self) {
        let capacity = self.inner.cfg.capacity.max(1);
        let limiter = Arc::new(RateLimiter::new(self.inner.cfg.fetch_interval));
        info!(
            capacity,
            fetch_interval_ms = self.inner.cfg.fetch_interval.as_millis() as u64,
            "poller started"
        );

        let mut workers = JoinSet::new();
        for worker in 0..capacity {
            let inner = Arc::clone(&self.inner);
            let limiter = Arc::clone(&limiter);
            workers.spawn(async move { inner.worker(worker, &limiter).await });
        }
        while let Some(res) = workers.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "poll worker terminated abnormally");
            }
        }

        self.inner.done.cancel();
        info!("all poll workers exited");
    }

    /// Fetch and run at most one task, then report the poller as drained.
    pub async fn poll_once(&self) {
        let limiter = RateLimiter::new(self.inner.cfg.fetch_interval);
        self.inner.poll_once(&limiter).await;
        self.inner.done.cancel();
    }

    /// Stop polling and wait for workers to drain.
    ///
    /// Once `grace` has elapsed, running jobs are cancelled and the call keeps
    /// waiting for the drain, then returns [`CoreError::ShutdownTimeout`].
    /// Must be paired with a running [`Poller::poll`] or [`Poller::poll_once`].
    pub async fn shutdown(&self, grace: Duration) -> Result<(), CoreError> {
        let inner = &self.inner;
        inner.polling.cancel();
        info!(grace_ms = grace.as_millis() as u64, "shutdown requested; polling stopped");

        tokio::select! {
            biased;
            _ = inner.done.cancelled() => {
                info!("all workers stopped within grace period");
                return Ok(());
            }
            _ = tokio::time::sleep(grace) => {}
        }

        // The drain may have completed right as the timer fired.
        if inner.done.is_cancelled() {
            info!("all workers stopped within grace period");
            return Ok(());
        }

        warn!("grace period exceeded; cancelling running jobs");
        inner.jobs.cancel();
        inner.done.cancelled().await;
        info!("running jobs drained after forced cancellation");

        Err(CoreError::ShutdownTimeout(grace))
    }

    pub fn state(&self) -> PollerState {
        let inner = &self.inner;
        if inner.done.is_cancelled() {
            PollerState::Drained
        } else if inner.jobs.is_cancelled() {
            PollerState::ForcedStop
        } else if inner.polling.is_cancelled() {
            PollerState::GracefulStop
        } else {
            PollerState::Running
        }
    }

    pub fn tasks_version(&self) -> TasksVersion {
        self.inner.tasks_version.load(Ordering::Acquire)
    }
}

impl Inner {
    async fn worker(&self, worker: usize, limiter: &RateLimiter) {
        debug!(worker, "poll worker started");
        loop {
            self.poll_once(limiter).await;
            if self.polling.is_cancelled() {
                debug!(worker, "poll worker stopped");
                return;
            }
        }
    }

    async fn poll_once(&self, limiter: &RateLimiter) {
        loop {
            if let Err(e) = limiter.wait(&self.polling).await {
                debug!(error = %e, "limiter wait failed");
                return;
            }
            let Some(task) = self.fetch_task().await else {
                continue;
            };

            self.run_task_with_recover(task).await;
            return;
        }
    }

    async fn fetch_task(&self) -> Option<Task> {
        // Version in the cache when the request was sent.
        let v = self.tasks_version.load(Ordering::Acquire);

        let res = tokio::select! {
            _ = self.polling.cancelled() => return None,
            res = tokio::time::timeout(self.cfg.fetch_timeout, self.source.fetch_task(v)) => res,
        };
        let fetched = match res {
            Ok(Ok(fetched)) => fetched,
            Err(_) | Ok(Err(FetchError::DeadlineExceeded)) => {
                trace!(tasks_version = v, "fetch deadline exceeded");
                return None;
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed to fetch task");
                return None;
            }
        };

        if fetched.tasks_version > v {
            let _ = self.tasks_version.compare_exchange(
                v,
                fetched.tasks_version,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }

        let task = fetched.task?;

        // A consumed task invalidates the server-side shortcut; force a full query next time.
        let _ = self.tasks_version.compare_exchange(
            fetched.tasks_version,
            0,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Some(task)
    }

    #[instrument(level = "info", skip(self, task), fields(task_id = task.id, repository = %task.repository()))]
    async fn run_task_with_recover(&self, task: Task) {
        if let Err(reason) = self.allow.check(task.repository()) {
            error!(%reason, "task skipped");
            return;
        }

        let executor = Arc::clone(&self.executor);
        let cancel = self.jobs.child_token();
        let handle = tokio::spawn(
            async move { executor.run(cancel, task).await }.in_current_span(),
        );

        match handle.await {
            Ok(Ok(())) => info!("task finished"),
            Ok(Err(e)) => error!(error = %e, "failed to run task"),
            Err(e) if e.is_panic() => {
                error!(panic = %panic_message(e.into_panic()), "panic while running task")
            }
            Err(e) => error!(error = %e, "task execution aborted"),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
