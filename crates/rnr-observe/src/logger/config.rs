use serde::Deserialize;

use crate::logger::format::LoggerFormat;

/// Logger settings, as found under the `log` section of the daemon config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `rnr_core=debug,info`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        // NO_COLOR (https://no-color.org) disables ANSI even on a terminal.
        let use_color =
            atty::is(atty::Stream::Stdout) && std::env::var_os("NO_COLOR").is_none();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: LoggerConfig = serde_yaml::from_str("level: debug").unwrap();
        assert_eq!(cfg.level, "debug");
        assert_eq!(cfg.format, LoggerFormat::Text);
        assert!(cfg.with_targets);
    }

    #[test]
    fn format_is_parsed_from_string() {
        let cfg: LoggerConfig = serde_yaml::from_str("format: json").unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert!(serde_yaml::from_str::<LoggerConfig>("format: xml").is_err());
    }
}
