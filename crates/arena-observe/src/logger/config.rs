use std::io::IsTerminal;

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Environment variable holding the `EnvFilter` directive.
pub const ENV_FILTER: &str = "ARENA_LOG";
/// Environment variable selecting the [`LoggerFormat`].
pub const ENV_FORMAT: &str = "ARENA_LOG_FORMAT";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `info,arena.exec.session=trace`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `ARENA_LOG` and `ARENA_LOG_FORMAT` when set.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(level) = lookup(ENV_FILTER).filter(|v| !v.trim().is_empty()) {
            cfg.level = level.trim().to_string();
        }
        if let Some(format) = lookup(ENV_FORMAT) {
            cfg.format = format.parse()?;
        }
        if cfg.format != LoggerFormat::Text {
            cfg.use_color = false;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let cfg = LoggerConfig::from_lookup(|key| match key {
            ENV_FILTER => Some("debug,arena.exec=trace".into()),
            ENV_FORMAT => Some("json".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.level, "debug,arena.exec=trace");
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert!(!cfg.use_color);
    }

    #[test]
    fn blank_filter_keeps_default_level() {
        let cfg = LoggerConfig::from_lookup(|key| (key == ENV_FILTER).then(|| "  ".into())).unwrap();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LoggerFormat::Text);
    }

    #[test]
    fn bad_format_is_reported() {
        let res = LoggerConfig::from_lookup(|key| (key == ENV_FORMAT).then(|| "yaml".into()));
        assert!(matches!(res, Err(LoggerError::InvalidFormat(_))));
    }
}
