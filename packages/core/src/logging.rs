//! Logging initialization
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by `RUST_LOG`,
//! falling back to the configured default directive.

use tracing_subscriber::EnvFilter;

use crate::config::CoreConfig;

fn env_filter(config: &CoreConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
}

/// Initialize global logging; returns `false` if a subscriber was already set
pub fn init(config: &CoreConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true)
        .try_init()
        .is_ok()
}
