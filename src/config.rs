//! # Global runtime configuration.
//!
//! [`Config`] centralizes the knobs of a job run: the poll interval of the completion
//! poller and the default log filter.
//!
//! Config is used in two ways:
//! 1. **Polling**: `JobRunner::execute_with(&config)`
//! 2. **Logging**: `observability::ensure_initialized(&config.log_filter)` (feature `logging`)
//!
//! ## Environment
//! - `BATCHVISOR_POLL_INTERVAL_MS` → [`Config::poll_interval_ms`]
//! - `BATCHVISOR_LOG` → [`Config::log_filter`]
//!
//! Missing keys keep their defaults; unparsable values are rejected.
//!
//! # Example
//! ```
//! use batchvisor::Config;
//!
//! let cfg = Config::from_lookup(|key| match key {
//!     "BATCHVISOR_POLL_INTERVAL_MS" => Some("250".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(cfg.poll_interval_ms, 250);
//! assert_eq!(cfg.log_filter, "info");
//! ```

use std::time::Duration;

use crate::error::RuntimeError;

/// Environment key for [`Config::poll_interval_ms`].
pub const ENV_POLL_INTERVAL_MS: &str = "BATCHVISOR_POLL_INTERVAL_MS";
/// Environment key for [`Config::log_filter`].
pub const ENV_LOG: &str = "BATCHVISOR_LOG";

/// Runtime configuration.
///
/// ## Field semantics
/// - `poll_interval_ms`: Sleep between status reads (`0` is invalid and rejected by the runner)
/// - `log_filter`: Default `EnvFilter` directive when `RUST_LOG` is unset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Milliseconds to sleep between two status reads of a running job.
    pub poll_interval_ms: u64,

    /// Default log filter directive (e.g. `"info"`, `"batchvisor=debug"`).
    pub log_filter: String,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// ### Errors
    /// `InvalidArgument` if `BATCHVISOR_POLL_INTERVAL_MS` is not a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            let ms: u64 = raw.trim().parse().map_err(|e| {
                RuntimeError::invalid_argument(ENV_POLL_INTERVAL_MS, format!("`{raw}`: {e}"))
            })?;
            if ms == 0 {
                return Err(RuntimeError::invalid_argument(
                    ENV_POLL_INTERVAL_MS,
                    "must be >= 1",
                ));
            }
            cfg.poll_interval_ms = ms;
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|f| !f.trim().is_empty()) {
            cfg.log_filter = filter;
        }

        Ok(cfg)
    }

    /// Returns the poll interval as a `Duration`.
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `poll_interval_ms = 1000`
    /// - `log_filter = "info"`
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            log_filter: "info".to_string(),
        }
    }
}
