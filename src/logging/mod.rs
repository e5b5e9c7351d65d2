//! # Logging
//!
//! Installs an `env_logger` backend configured from [`LogConfig`]: a default
//! level plus per-feature levels applied to the matching crate modules.

pub mod config;

use config::{parse_level, LogConfig};
use once_cell::sync::OnceCell;

/// Configuration the logger was installed with
static LOGGING_CONFIG: OnceCell<LogConfig> = OnceCell::new();

pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize the logging system with default configuration
    pub fn init_default() -> Result<(), LoggingError> {
        Self::init_with_config(LogConfig::default())
    }

    /// Initialize the logging system with a custom configuration
    pub fn init_with_config(config: LogConfig) -> Result<(), LoggingError> {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(parse_level(&config.default_level)?);
        for (feature, level) in &config.features {
            builder.filter_module(&LogConfig::feature_target(feature), parse_level(level)?);
        }

        LOGGING_CONFIG
            .set(config)
            .map_err(|_| LoggingError::AlreadyInitialized)?;
        builder.try_init()?;
        Ok(())
    }

    /// Get the configuration the logger was installed with
    pub fn get_config() -> Option<&'static LogConfig> {
        LOGGING_CONFIG.get()
    }
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("Failed to install logger: {0}")]
    SetLogger(#[from] log::SetLoggerError),
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Install a test logger; repeated calls are ignored.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
