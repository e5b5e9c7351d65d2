//! Configuration for VDB composition
//!
//! Settings are read from a TOML file and may be overridden through
//! `VDBFOLD_*` environment variables.

pub mod error;

pub use error::{ConfigError, ConfigResult};

use crate::logging::config::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Composition settings shared by the nodes of a deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Run the metadata repository enrichment pass when a node finishes loading
    #[serde(default = "default_enrich_on_load")]
    pub enrich_on_load: bool,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

fn default_enrich_on_load() -> bool {
    true
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            enrich_on_load: default_enrich_on_load(),
            log: LogConfig::default(),
        }
    }
}

impl CompositionConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without environment overrides
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `VDBFOLD_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Ok(value) = std::env::var("VDBFOLD_ENRICH_ON_LOAD") {
            self.enrich_on_load = value
                .parse()
                .map_err(|_| ConfigError::validation(format!("VDBFOLD_ENRICH_ON_LOAD must be true or false, got '{}'", value)))?;
        }
        self.log.apply_env_overrides();
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.log.validate()
    }

    /// Save configuration as TOML, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
