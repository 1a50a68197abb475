mod config;
mod error;
mod format;
mod log;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;
pub use log::LOG_ENV;

/// Install the global subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] when called twice in one process.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = log::filter(cfg)?;
    let layer = match cfg.format {
        LoggerFormat::Text => log::text_layer(cfg),
        LoggerFormat::Json => log::json_layer(cfg),
        LoggerFormat::Journald => log::journald_layer(cfg)?,
    };
    log::install(filter, layer)
}
