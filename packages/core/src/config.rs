//! Configuration for the core services

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound for share lists, matching what clients can display
const MAX_SUPPORTED_SHARES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Default `tracing` filter directive (overridden by `RUST_LOG`)
    pub log_filter: String,

    /// Timeout for a whole coverage computation in milliseconds (0 = none)
    pub data_access_timeout_ms: u64,

    /// Recompute coverage right after content mutations instead of waiting
    /// for the next maintenance run
    pub recompute_coverage_on_change: bool,

    /// Annotation keys with more distinct values than this don't list them
    pub annotation_aggregation_values_limit: usize,

    /// Maximum number of users in each share list
    pub max_shares: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_filter: "tekst_core=info".to_string(),
            data_access_timeout_ms: 0,
            recompute_coverage_on_change: false,
            annotation_aggregation_values_limit: 3,
            max_shares: 64,
        }
    }
}

impl CoreConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: CoreConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid config in {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Timeout for coverage computations, if any
    pub fn data_access_timeout(&self) -> Option<Duration> {
        (self.data_access_timeout_ms > 0).then(|| Duration::from_millis(self.data_access_timeout_ms))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.log_filter.trim().is_empty() {
            return Err("log_filter cannot be empty".to_string());
        }

        if self.max_shares == 0 {
            return Err("max_shares must be greater than 0".to_string());
        }

        if self.max_shares > MAX_SUPPORTED_SHARES {
            return Err(format!(
                "max_shares cannot exceed {}",
                MAX_SUPPORTED_SHARES
            ));
        }

        Ok(())
    }
}
