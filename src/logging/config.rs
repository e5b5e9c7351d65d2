//! Configuration for the logging system
//!
//! Levels are read from the `[log]` section of the composition configuration
//! and can be overridden with `VDBFOLD_LOG_LEVEL` and
//! `VDBFOLD_LOG_FEATURE_<NAME>` environment variables.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log level for all modules
    #[serde(default = "default_level")]
    pub default_level: String,
    /// Per-feature log levels, keyed by the crate module name
    /// (`composite`, `enrichment`, `function`, ...)
    #[serde(default)]
    pub features: HashMap<String, String>,
}

fn default_level() -> String {
    "INFO".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: default_level(),
            features: HashMap::new(),
        }
    }
}

impl LogConfig {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("VDBFOLD_LOG_LEVEL") {
            self.default_level = level;
        }
        for (key, value) in std::env::vars() {
            if let Some(feature) = key.strip_prefix("VDBFOLD_LOG_FEATURE_") {
                self.features.insert(feature.to_lowercase(), value);
            }
        }
    }

    /// Check that every configured level is recognised
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_level(&self.default_level)?;
        for level in self.features.values() {
            parse_level(level)?;
        }
        Ok(())
    }

    /// The module path a feature's level applies to
    pub fn feature_target(feature: &str) -> String {
        format!("{}::{}", env!("CARGO_CRATE_NAME"), feature)
    }
}

/// Parse a level name, case-insensitively
pub fn parse_level(level: &str) -> Result<log::LevelFilter, ConfigError> {
    match level.to_uppercase().as_str() {
        "TRACE" => Ok(log::LevelFilter::Trace),
        "DEBUG" => Ok(log::LevelFilter::Debug),
        "INFO" => Ok(log::LevelFilter::Info),
        "WARN" => Ok(log::LevelFilter::Warn),
        "ERROR" => Ok(log::LevelFilter::Error),
        "OFF" => Ok(log::LevelFilter::Off),
        _ => Err(ConfigError::InvalidLevel(level.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("debug").unwrap(), log::LevelFilter::Debug);
        assert_eq!(parse_level("OFF").unwrap(), log::LevelFilter::Off);
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn feature_levels_are_validated() {
        let mut config = LogConfig::default();
        assert!(config.validate().is_ok());
        config.features.insert("composite".into(), "chatty".into());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLevel(l)) if l == "chatty"));
    }

    #[test]
    fn feature_target_is_module_path() {
        assert_eq!(LogConfig::feature_target("composite"), "vdbfold::composite");
    }
}
