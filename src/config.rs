//! Configuration for the archive loader tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (bgm-archive.toml)
//! - Environment variables (BGM_ARCHIVE_*)
//!
//! ## Example config file (bgm-archive.toml):
//! ```toml
//! policy = "collect"
//!
//! [report]
//! max_shown = 5
//! distinct_values = true
//! ```
//!
//! CLI flags take precedence over everything here.

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::stream::ErrorPolicy;

/// Loader configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Error policy applied when the CLI does not override it
    #[serde(default)]
    pub policy: ErrorPolicy,

    /// Failure-report display settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Failure-report display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Failures printed per entity before truncating
    #[serde(default = "default_max_shown")]
    pub max_shown: usize,

    /// Also print the set of distinct offending raw values per entity
    #[serde(default = "default_true")]
    pub distinct_values: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_shown: default_max_shown(),
            distinct_values: true,
        }
    }
}

fn default_max_shown() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl LoaderConfig {
    /// Load from `bgm-archive.toml` (if present) and `BGM_ARCHIVE_*`
    /// environment variables, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_named("bgm-archive")
    }

    fn load_named(name: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("BGM_ARCHIVE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = LoaderConfig::load_named("definitely-not-present").unwrap();
        assert_eq!(config.policy, ErrorPolicy::Collect);
        assert_eq!(config.report.max_shown, 5);
        assert!(config.report.distinct_values);
    }
}
