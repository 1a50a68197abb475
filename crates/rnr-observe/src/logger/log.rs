use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::logger::{config::LoggerConfig, error::LoggerError};

/// Overrides the configured level directive when set.
pub const LOG_ENV: &str = "RNR_LOG";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Human-readable lines with a local RFC 3339 timestamp.
pub(crate) fn text_layer(cfg: &LoggerConfig) -> BoxedLayer {
    fmt::layer()
        .with_ansi(cfg.use_color)
        .with_target(cfg.with_targets)
        .with_timer(local_timer())
        .boxed()
}

/// One JSON object per event; span fields such as `task_id` are flattened in.
pub(crate) fn json_layer(cfg: &LoggerConfig) -> BoxedLayer {
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(cfg.with_targets)
        .with_timer(local_timer())
        .boxed()
}

#[cfg(all(target_os = "linux", feature = "journald"))]
pub(crate) fn journald_layer(_cfg: &LoggerConfig) -> Result<BoxedLayer, LoggerError> {
    tracing_journald::layer()
        .map(|l| l.with_syslog_identifier("rnr-agentd".to_string()).boxed())
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
pub(crate) fn journald_layer(_cfg: &LoggerConfig) -> Result<BoxedLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

/// `RNR_LOG` wins over the configured directive.
pub(crate) fn filter(cfg: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let directive = std::env::var(LOG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| cfg.level.clone());
    parse_filter(&directive)
}

fn parse_filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|_| LoggerError::InvalidLogLevel(directive.to_string()))
}

// Local offset lookup fails once other threads exist; fall back to UTC.
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

pub(crate) fn install(filter: EnvFilter, layer: BoxedLayer) -> Result<(), LoggerError> {
    try_install(Registry::default().with(layer).with(filter))
}

fn try_install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let msg = e.to_string();
        if msg.contains("global default") || msg.contains("SetGlobalDefaultError") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::InitializationFailed(msg)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_rejected() {
        let err = parse_filter("rnr_core=loud").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLogLevel(ref d) if d == "rnr_core=loud"));
        assert!(parse_filter("rnr_core=debug,info").is_ok());
    }

    #[test]
    fn second_install_fails() {
        let cfg = LoggerConfig::default();
        // Another test in this binary may have installed first; the second call fails either way.
        let _ = install(parse_filter("info").unwrap(), text_layer(&cfg));
        assert!(install(parse_filter("info").unwrap(), json_layer(&cfg)).is_err());
    }

    #[cfg(not(all(target_os = "linux", feature = "journald")))]
    #[test]
    fn journald_needs_the_feature() {
        let err = journald_layer(&LoggerConfig::default()).err().unwrap();
        assert!(matches!(err, LoggerError::JournaldNotSupported));
    }
}
