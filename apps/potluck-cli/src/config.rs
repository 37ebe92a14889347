//! CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! Command-line flags override what is loaded here.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log line layout on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::InvalidValue("POTLUCK_LOG_FORMAT".to_string())),
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// tracing filter directive (e.g. `warn`, `potluck_core=debug`)
    pub log_filter: String,

    /// Log line layout
    pub log_format: LogFormat,

    /// Indent JSON output
    pub pretty_json: bool,
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let log_filter = lookup("POTLUCK_LOG").unwrap_or_else(|| "warn".to_string());
        EnvFilter::try_new(&log_filter)
            .map_err(|_| ConfigError::InvalidValue("POTLUCK_LOG".to_string()))?;

        let config = CliConfig {
            log_filter,

            log_format: lookup("POTLUCK_LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .parse()?,

            pretty_json: lookup("POTLUCK_PRETTY_JSON")
                .unwrap_or_else(|| "true".to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("POTLUCK_PRETTY_JSON".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
