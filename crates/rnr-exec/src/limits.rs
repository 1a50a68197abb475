//! POSIX rlimits applied to job processes.
//!
//! On Unix the limits are set in a `pre_exec` hook, after `fork()` and before
//! `execve()`, so the job never runs unrestricted. Elsewhere they are ignored
//! with a warning.
use serde::Deserialize;
use tokio::process::Command;

/// Per-job resource limits. `None` leaves the inherited limit in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RlimitConfig {
    /// `RLIMIT_NOFILE`.
    pub max_open_files: Option<u64>,
    /// `RLIMIT_FSIZE`; writes beyond it raise `SIGXFSZ` in the job.
    pub max_file_size_bytes: Option<u64>,
    /// `RLIMIT_CPU` in seconds.
    pub max_cpu_seconds: Option<u64>,
    pub disable_core_dumps: bool,
}

impl RlimitConfig {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_open_files.is_none()
            && self.max_file_size_bytes.is_none()
            && self.max_cpu_seconds.is_none()
            && !self.disable_core_dumps
    }
}

pub fn attach_rlimits(cmd: &mut Command, config: &RlimitConfig) {
    if config.is_empty() {
        return;
    }

    #[cfg(unix)]
    {
        unix_impl::attach_rlimits(cmd, config);
    }

    #[cfg(not(unix))]
    {
        let _ = cmd;
        tracing::warn!(?config, "rlimits are not supported on this platform; ignoring");
    }
}

#[cfg(unix)]
mod unix_impl {
    use std::io;

    use tokio::process::Command;

    use super::RlimitConfig;

    pub fn attach_rlimits(cmd: &mut Command, config: &RlimitConfig) {
        let RlimitConfig {
            max_open_files,
            max_file_size_bytes,
            max_cpu_seconds,
            disable_core_dumps,
        } = config.clone();

        // SAFETY: the hook only calls async-signal-safe setrlimit.
        unsafe {
            cmd.pre_exec(move || {
                if let Some(n) = max_open_files {
                    check(libc::setrlimit(libc::RLIMIT_NOFILE, &rlimit(n)))?;
                }
                if let Some(n) = max_file_size_bytes {
                    check(libc::setrlimit(libc::RLIMIT_FSIZE, &rlimit(n)))?;
                }
                if let Some(n) = max_cpu_seconds {
                    check(libc::setrlimit(libc::RLIMIT_CPU, &rlimit(n)))?;
                }
                if disable_core_dumps {
                    check(libc::setrlimit(libc::RLIMIT_CORE, &rlimit(0)))?;
                }
                Ok(())
            });
        }
    }

    fn rlimit(value: u64) -> libc::rlimit {
        libc::rlimit {
            rlim_cur: value as libc::rlim_t,
            rlim_max: value as libc::rlim_t,
        }
    }

    fn check(rc: libc::c_int) -> io::Result<()> {
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(RlimitConfig::default().is_empty());
        let cfg = RlimitConfig {
            max_cpu_seconds: Some(60),
            ..Default::default()
        };
        assert!(!cfg.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn open_file_limit_is_visible_to_the_child() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("ulimit -n");
        attach_rlimits(
            &mut cmd,
            &RlimitConfig {
                max_open_files: Some(64),
                ..Default::default()
            },
        );
        let out = cmd.output().await.unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "64");
    }
}
