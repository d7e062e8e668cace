//! # dnsvigil Configuration
//!
//! Policy knobs for the passive DNS monitor, loaded once at startup and
//! shared read-only (behind an `Arc`) with every session. Supports YAML,
//! JSON, and TOML, picked by file extension, with YAML as the default.
//!
//! Every option has a sensible default; an empty file is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML syntax error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value failed validation.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Configuration file does not exist.
    #[error("file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Monitor-wide policy configuration.
///
/// The skip filters exist because busy recursive resolvers attach bulky,
/// low-value authority/additional sections to every answer; skipping them
/// per responder keeps the event volume down without losing the answers
/// themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Ceiling on a message's question count; 0 disables the check.
    ///
    /// Non-DNS traffic on port 53 tends to decode into absurd question
    /// counts, so a small ceiling weeds most of it out.
    pub max_queries: u32,

    /// Skip the authority section of every message.
    pub skip_all_auth: bool,

    /// Skip the additional section of every message.
    pub skip_all_addl: bool,

    /// Skip authority sections from these responders.
    pub skip_auth: HashSet<IpAddr>,

    /// Skip additional sections from these responders.
    pub skip_addl: HashSet<IpAddr>,

    /// Idle timeout for UDP sessions, in seconds.
    pub session_timeout: f64,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_queries: 25,
            skip_all_auth: false,
            skip_all_addl: false,
            skip_auth: HashSet::new(),
            skip_addl: HashSet::new(),
            session_timeout: 10.0,
            logging: LoggingConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Loads configuration from a file, dispatching on the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.session_timeout.is_finite() || self.session_timeout <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "session_timeout".into(),
                message: "must be a positive number of seconds".into(),
            });
        }

        self.logging.validate()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, or error.
    pub level: String,

    /// Log format: "text" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        if !matches!(
            self.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".into(),
                message: format!("unknown level {:?}", self.level),
            });
        }

        if !matches!(self.format.as_str(), "text" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format".into(),
                message: format!("unknown format {:?}", self.format),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();

        assert_eq!(config.max_queries, 25);
        assert!(!config.skip_all_auth);
        assert!(!config.skip_all_addl);
        assert!(config.skip_auth.is_empty());
        assert!((config.session_timeout - 10.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_defaults() {
        let config = MonitorConfig::from_yaml("{}").unwrap();
        assert_eq!(config.max_queries, 25);
    }

    #[test]
    fn test_yaml_parse() {
        let yaml = r"
max_queries: 50
skip_all_addl: true
skip_auth:
  - 192.0.2.1
  - 2001:db8::1
session_timeout: 30.0
logging:
  level: debug
  format: json
";

        let config = MonitorConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.max_queries, 50);
        assert!(config.skip_all_addl);
        assert!(config.skip_auth.contains(&"192.0.2.1".parse().unwrap()));
        assert!(config.skip_auth.contains(&"2001:db8::1".parse().unwrap()));
        assert!((config.session_timeout - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let err = MonitorConfig::from_yaml("session_timeout: 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = MonitorConfig::from_yaml("session_timeout: -5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let err = MonitorConfig::from_yaml("logging:\n  level: loud").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = MonitorConfig::from_yaml("max_querys: 10").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_file_not_found() {
        let err = MonitorConfig::from_file("/nonexistent/dnsvigil.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = MonitorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MonitorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_queries, config.max_queries);
    }
}
