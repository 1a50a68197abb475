use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use rnr_core::PollerConfig;
use rnr_exec::{ExecConfig, RlimitConfig};
use rnr_observe::LoggerConfig;
use rnr_report::ReporterConfig;

/// Environment variable naming the config file when no path is given.
pub const CONFIG_ENV: &str = "RNR_CONFIG";

const DEFAULT_TIMEOUT_MS: u64 = 3 * 60 * 60 * 1000;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_FETCH_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LoggerConfig,
    pub runner: RunnerSection,
    pub exec: ExecSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Registration file written at registration time.
    pub file: PathBuf,
    pub capacity: i64,
    pub envs: HashMap<String, String>,
    pub timeout_ms: u64,
    /// Grace period for running jobs on shutdown; 0 cancels them at once.
    pub shutdown_timeout_ms: u64,
    pub insecure: bool,
    pub fetch_timeout_ms: u64,
    pub fetch_interval_ms: u64,
    /// Overrides the labels stored in the registration file.
    pub labels: Vec<String>,
    pub allowed_repos: Vec<String>,
    pub debug_output: bool,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            file: PathBuf::from(".runner"),
            capacity: 1,
            envs: HashMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            shutdown_timeout_ms: 0,
            insecure: false,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            fetch_interval_ms: DEFAULT_FETCH_INTERVAL_MS,
            labels: Vec::new(),
            allowed_repos: Vec::new(),
            debug_output: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecSection {
    pub program: String,
    pub args: Vec<String>,
    /// Run through the platform shell instead of `program`.
    pub script: Option<String>,
    pub workdir_parent: PathBuf,
    pub kill_grace_ms: u64,
    pub rlimits: RlimitConfig,
}

impl Default for ExecSection {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            script: None,
            workdir_parent: PathBuf::from("workspace"),
            kill_grace_ms: 10_000,
            rlimits: RlimitConfig::default(),
        }
    }
}

impl Config {
    /// Read `path`, or return the defaults when there is none.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let cfg = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("read config {}", path.display()))?;
                Self::parse(&raw).with_context(|| format!("parse config {}", path.display()))?
            }
            None => Self::default(),
        };
        Ok(cfg.normalized())
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default().normalized());
        }
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg.normalized())
    }

    fn normalized(mut self) -> Self {
        let r = &mut self.runner;
        if r.file.as_os_str().is_empty() {
            r.file = PathBuf::from(".runner");
        }
        if r.capacity <= 0 {
            r.capacity = 1;
        }
        if r.timeout_ms == 0 {
            r.timeout_ms = DEFAULT_TIMEOUT_MS;
        }
        if r.fetch_timeout_ms == 0 {
            r.fetch_timeout_ms = DEFAULT_FETCH_TIMEOUT_MS;
        }
        if r.fetch_interval_ms == 0 {
            r.fetch_interval_ms = DEFAULT_FETCH_INTERVAL_MS;
        }
        if self.exec.workdir_parent.as_os_str().is_empty() {
            self.exec.workdir_parent = PathBuf::from("workspace");
        }
        self
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.runner.shutdown_timeout_ms)
    }

    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            capacity: self.runner.capacity as usize,
            fetch_interval: Duration::from_millis(self.runner.fetch_interval_ms),
            fetch_timeout: Duration::from_millis(self.runner.fetch_timeout_ms),
            allowed_repos: self.runner.allowed_repos.clone(),
        }
    }

    pub fn reporter(&self) -> ReporterConfig {
        ReporterConfig {
            debug_output: self.runner.debug_output,
            ..Default::default()
        }
    }

    pub fn exec(&self) -> ExecConfig {
        let mut env: Vec<_> = self
            .runner
            .envs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.sort();
        ExecConfig {
            program: self.exec.program.clone(),
            args: self.exec.args.clone(),
            script: self.exec.script.clone(),
            env,
            workdir_parent: self.exec.workdir_parent.clone(),
            timeout: Duration::from_millis(self.runner.timeout_ms),
            kill_grace: Duration::from_millis(self.exec.kill_grace_ms),
            fail_on_non_zero: true,
            rlimits: self.exec.rlimits.clone(),
            reporter: self.reporter(),
        }
    }
}
