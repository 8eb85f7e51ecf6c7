//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/offlinedb",
//!   "storage_limit_bytes": 1073741824,
//!   "sensitive_fields": ["dna_secrets"],
//!   "oversize_policy": "reject",
//!   "http": { "port": 7420 },
//!   "tasks": { "build_threshold": 0.9199 }
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::observability::Severity;
use crate::store::StoreConfig;
use crate::submitter::TaskConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Store settings, at the top level of the file
    #[serde(flatten)]
    pub store: StoreConfig,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub tasks: TaskConfig,

    /// Lowest severity logged (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config("data_dir must not be empty"));
        }

        self.store
            .validate()
            .map_err(|e| CliError::config(e.to_string()))?;

        let threshold = self.tasks.build_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(CliError::config(format!(
                "tasks.build_threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        self.log_severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn log_severity(&self) -> CliResult<Severity> {
        self.log_level.parse().map_err(CliError::Config)
    }
}
