use std::borrow::Cow;

use tracing::{debug, warn};

use crate::command::{Command, parse_command};
use crate::mask::Masker;

/// Whether workflow commands are currently being interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandState {
    Active,
    /// Entered by `::stop-commands::<token>`; left by a line that is exactly `::<token>::`.
    Suppressed { token: String },
}

/// Streaming interpreter for the workflow commands embedded in job output.
///
/// One instance per job. Lines must be fed in arrival order: masks only
/// apply to lines processed after they were added.
#[derive(Debug)]
pub struct LogCommandProcessor {
    masker: Masker,
    state: CommandState,
    debug_enabled: bool,
}

impl LogCommandProcessor {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            masker: Masker::new(),
            state: CommandState::Active,
            debug_enabled,
        }
    }

    /// Pre-load masks, typically the job's secret values.
    pub fn with_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for secret in secrets {
            self.masker.add(secret.as_ref());
        }
        self
    }

    pub fn state(&self) -> &CommandState {
        &self.state
    }

    pub fn mask_count(&self) -> usize {
        self.masker.len()
    }

    /// Process one raw line; `None` means the line must not be forwarded.
    pub fn process_line(&mut self, raw: &str) -> Option<String> {
        let content = raw.trim_end_matches(['\r', '\n']);

        let output = match &self.state {
            CommandState::Suppressed { token } => {
                if is_terminator(content, token) {
                    debug!("command processing resumed");
                    self.state = CommandState::Active;
                    return None;
                }
                Cow::Borrowed(content)
            }
            CommandState::Active => match parse_command(content) {
                Some(cmd) => self.handle_command(content, cmd)?,
                None => Cow::Borrowed(content),
            },
        };

        Some(self.masker.mask(&output))
    }

    fn handle_command<'a>(&mut self, line: &'a str, cmd: Command<'a>) -> Option<Cow<'a, str>> {
        match cmd.name {
            "add-mask" => {
                self.masker.add(cmd.value);
                None
            }
            "debug" => self.debug_enabled.then_some(Cow::Borrowed(cmd.value)),
            "stop-commands" => {
                if cmd.value.is_empty() {
                    warn!("stop-commands without a token ignored");
                } else {
                    debug!("command processing stopped");
                    self.state = CommandState::Suppressed {
                        token: cmd.value.to_string(),
                    };
                }
                None
            }
            // group, endgroup, notice, warning, error and unknown commands are
            // rendered by the orchestrator's log viewer.
            _ => Some(Cow::Borrowed(line)),
        }
    }
}

fn is_terminator(line: &str, token: &str) -> bool {
    line.strip_prefix("::")
        .and_then(|rest| rest.strip_suffix("::"))
        .is_some_and(|inner| inner == token)
}
