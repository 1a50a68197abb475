use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use rnr_client::{ClientConfig, RunnerClient};
use rnr_core::Poller;
use rnr_exec::HostExecutor;
use rnr_model::{Label, Labels, Registration};
use rnr_observe::logger_init;

mod config;
mod registration;
mod shutdown;

use config::{CONFIG_ENV, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut once = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--once" => once = true,
            _ => path = Some(PathBuf::from(arg)),
        }
    }
    let path = path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let cfg = Config::load(path.as_deref()).context("invalid configuration")?;
    logger_init(&cfg.log)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting runner daemon");

    let mut reg = registration::load(&cfg.runner.file)?;
    let labels = resolve_labels(&cfg, &reg);
    if labels.is_empty() {
        warn!("no labels configured, runner may not be able to pick up jobs");
    }

    let client = Arc::new(RunnerClient::new(ClientConfig::from_registration(
        &reg,
        cfg.runner.insecure,
    ))?);

    match client.declare(labels.names()).await {
        Ok(_) => {
            info!(runner = %runner_name(&reg), labels = ?labels.to_strings(), "declared");
            reg.labels = labels.to_strings();
            registration::save(&cfg.runner.file, &reg)?;
        }
        Err(e) if e.is_unimplemented() => {
            warn!("orchestrator does not support declare; skipping label and version declaration");
        }
        Err(e) => {
            error!(error = %e, "failed to declare runner");
            return Err(e.into());
        }
    }

    let executor = Arc::new(HostExecutor::new(cfg.exec(), client.clone()));
    let poller = Poller::new(cfg.poller(), client, executor);

    if once {
        poller.poll_once().await;
        return Ok(());
    }

    let p = poller.clone();
    let mut polling = tokio::spawn(async move { p.poll().await });
    let exited = tokio::select! {
        res = shutdown::wait_for_signal() => {
            res.context("install signal handlers")?;
            None
        }
        res = &mut polling => {
            warn!("poller exited on its own");
            Some(res)
        }
    };

    if let Err(e) = poller.shutdown(cfg.shutdown_timeout()).await {
        warn!(error = %e, "running jobs were cancelled");
    }
    let joined = match exited {
        Some(res) => res,
        None => polling.await,
    };
    if let Err(e) = joined {
        error!(error = %e, "poller task failed");
    }
    info!("runner stopped");
    Ok(())
}

/// Config labels win over the ones stored at registration; invalid ones are skipped.
fn resolve_labels(cfg: &Config, reg: &Registration) -> Labels {
    let raw = if cfg.runner.labels.is_empty() {
        &reg.labels
    } else {
        &cfg.runner.labels
    };
    let mut labels = Vec::with_capacity(raw.len());
    for s in raw {
        match s.parse::<Label>() {
            Ok(label) => labels.push(label),
            Err(e) => warn!(label = %s, error = %e, "ignored invalid label"),
        }
    }
    Labels(labels)
}

fn runner_name(reg: &Registration) -> String {
    if !reg.name.is_empty() {
        return reg.name.clone();
    }
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_labels_override_registration() {
        let reg = Registration {
            labels: vec!["old".into()],
            ..Default::default()
        };
        let mut cfg = Config::default();
        assert_eq!(resolve_labels(&cfg, &reg).names(), vec!["old"]);

        cfg.runner.labels = vec![
            "linux".into(),
            "bad:vm".into(),
            "ubuntu:docker://node:20".into(),
        ];
        let labels = resolve_labels(&cfg, &reg);
        assert_eq!(labels.names(), vec!["linux", "ubuntu"]);
    }

    #[test]
    fn runner_name_prefers_registration() {
        let reg = Registration {
            name: "builder-1".into(),
            ..Default::default()
        };
        assert_eq!(runner_name(&reg), "builder-1");
        assert!(!runner_name(&Registration::default()).is_empty());
    }
}
