//! CLI configuration file.
//!
//! ```toml
//! [analyzer]
//! undefined_policy = "retain"      # or "drop"
//! close_validation = "propagate"   # or "strict"
//!
//! [analyzer.windows]
//! band = 252
//! smooth = 21
//!
//! [provider]
//! timeout_secs = 30
//! max_retries = 3
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use anyhow::{Context, Result};
use rangelab_core::{AnalyzerConfig, ProviderConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analyzer: AnalyzerConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("failed to parse config TOML")?;
        config.analyzer.windows.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}
