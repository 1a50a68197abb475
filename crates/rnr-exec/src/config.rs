use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

use rnr_report::ReporterConfig;

use crate::error::ExecError;
use crate::limits::RlimitConfig;

/// How the host executor launches a job.
///
/// With `script` set the script runs through the platform shell and
/// `program`/`args` are ignored.
#[derive(Clone, Debug)]
pub struct ExecConfig {
    pub program: String,
    pub args: Vec<String>,
    pub script: Option<String>,
    pub env: Vec<(String, String)>,
    /// Each task runs in `<workdir_parent>/<task id>`.
    pub workdir_parent: PathBuf,
    pub timeout: Duration,
    /// Time between SIGTERM and SIGKILL when a job is stopped.
    pub kill_grace: Duration,
    pub fail_on_non_zero: bool,
    pub rlimits: RlimitConfig,
    pub reporter: ReporterConfig,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            script: None,
            env: Vec::new(),
            workdir_parent: PathBuf::from("workspace"),
            timeout: Duration::from_secs(3 * 60 * 60),
            kill_grace: Duration::from_secs(10),
            fail_on_non_zero: true,
            rlimits: RlimitConfig::default(),
            reporter: ReporterConfig::default(),
        }
    }
}

impl ExecConfig {
    pub(crate) fn command(&self) -> Result<Command, ExecError> {
        if let Some(script) = self.script.as_deref().filter(|s| !s.trim().is_empty()) {
            cfg_if::cfg_if! {
                if #[cfg(target_family = "windows")] {
                    let mut cmd = Command::new("cmd");
                    cmd.arg("/C").arg(script);
                } else {
                    let mut cmd = Command::new("sh");
                    cmd.arg("-c").arg(script);
                }
            }
            return Ok(cmd);
        }
        if self.program.is_empty() {
            return Err(ExecError::MissingProgram);
        }
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        Ok(cmd)
    }

    /// Human-readable command line for logs.
    pub(crate) fn describe(&self) -> String {
        match self.script.as_deref() {
            Some(script) => script.to_string(),
            None => std::iter::once(self.program.as_str())
                .chain(self.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_without_script_is_rejected() {
        let cfg = ExecConfig::default();
        assert!(matches!(cfg.command(), Err(ExecError::MissingProgram)));

        let blank_script = ExecConfig {
            script: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(blank_script.command(), Err(ExecError::MissingProgram)));
    }

    #[test]
    fn describe_joins_program_and_args() {
        let cfg = ExecConfig {
            program: "make".into(),
            args: vec!["ci".into(), "-j4".into()],
            ..Default::default()
        };
        assert_eq!(cfg.describe(), "make ci -j4");
    }
}
