//! Tracing/logging initialization.
//!
//! Installs a process-wide `tracing-subscriber` fmt subscriber. `RUST_LOG` wins over the
//! filter passed in, so operators can raise verbosity without reconfiguring the job.
//!
//! Enable with: `--features logging`

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops). Returns `true` only for the
/// call that installed this crate's subscriber; `false` if it was already initialized or
/// another global subscriber was set first.
pub fn ensure_initialized(default_filter: &str) -> bool {
    let mut installed_now = false;
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        installed_now = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok();
        installed_now
    });
    installed_now
}
