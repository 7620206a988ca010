//! # Controller Configuration
//!
//! Controller-level configuration loaded from environment variables.
//!
//! All configuration has sensible defaults and can be overridden via environment variables.
//! Environment variables are populated from a ConfigMap using `envFrom` in the deployment.

use crate::constants::{DEFAULT_EVENT_REPORTER, DEFAULT_LOG_BUFFER_SIZE};

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Number of action log lines kept for event context
    pub log_buffer_size: usize,
    /// Reporting controller name on emitted events
    pub event_reporter: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            log_buffer_size: DEFAULT_LOG_BUFFER_SIZE,
            event_reporter: DEFAULT_EVENT_REPORTER.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_buffer_size: env_var_or_default("ACTION_LOG_BUFFER_SIZE", DEFAULT_LOG_BUFFER_SIZE),
            event_reporter: env_var_or_default(
                "EVENT_REPORTER",
                DEFAULT_EVENT_REPORTER.to_string(),
            ),
        }
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
