use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use tracing::error;

use rnr_model::Registration;

const WARNING: &str = "This file is automatically generated by the runner. Do not edit it manually unless you know what you are doing. Removing this file will cause the runner to re-register as a new runner.";

pub fn load(path: &Path) -> anyhow::Result<Registration> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(path = %path.display(), "registration file not found, please register the runner first");
            return Err(e).context("registration file not found");
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load registration file {}", path.display()));
        }
    };
    let mut reg: Registration = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse registration file {}", path.display()))?;
    reg.warning.clear();
    Ok(reg)
}

pub fn save(path: &Path, reg: &Registration) -> anyhow::Result<()> {
    let reg = Registration {
        warning: WARNING.to_string(),
        ..reg.clone()
    };
    let raw = serde_json::to_string_pretty(&reg)?;
    std::fs::write(path, raw)
        .with_context(|| format!("failed to save registration file {}", path.display()))
}
