//! Logging configuration for the CLI.

use serde::{Deserialize, Serialize};

pub const ENV_LOG_LEVEL: &str = "FULLSTACK_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "FULLSTACK_LOG_JSON";

/// Structured logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_format: false }
    }
}

impl LoggingConfig {
    /// Create LoggingConfig from environment variables
    pub fn from_env() -> Self {
        let log_level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string());
        let json_format = std::env::var(ENV_LOG_JSON)
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self { log_level, json_format }
    }

    /// Raise the level to `debug` for `--verbose`
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.log_level = "debug".to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_format);
    }

    #[test]
    fn verbose_raises_level() {
        assert_eq!(LoggingConfig::default().with_verbose(true).log_level, "debug");
        assert_eq!(LoggingConfig::default().with_verbose(false).log_level, "info");
    }
}
