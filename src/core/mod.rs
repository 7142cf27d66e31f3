//! Runtime core: launching, polling and exit codes.
//!
//! The public API from this module is [`JobRunner`] (the completion poller) and
//! [`ExitCode`] (the exit-code deriver).
//!
//! Internal modules:
//! - [`runner`]: launches one job run and polls it to a terminal status;
//! - [`exit_code`]: maps the terminal state to a process exit code;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod exit_code;
mod runner;
mod shutdown;

pub use exit_code::ExitCode;
pub use runner::JobRunner;
pub use shutdown::{spawn_shutdown_watcher, wait_for_shutdown_signal};
