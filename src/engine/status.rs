//! # Batch status of a job run.
//!
//! [`BatchStatus`] mirrors the statuses reported by the job engine.
//! Four of them are terminal: polling stops once one is observed.
//!
//! ```text
//! Starting ─► Started ─┬─► Completed
//!                      ├─► Failed
//!                      ├─► Stopping ─► Stopped
//!                      └─► Abandoned
//! ```

use std::fmt;

/// Exit-status string that forces [`ExitCode::Warning`](crate::ExitCode::Warning).
pub const WARNING_EXIT_STATUS: &str = "WARNING";

/// Lifecycle status of a job run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BatchStatus {
    /// Launch requested, not running yet.
    #[default]
    Starting,
    /// Running.
    Started,
    /// Stop requested, still winding down.
    Stopping,
    /// Stopped on request (terminal).
    Stopped,
    /// Finished with a failure (terminal).
    Failed,
    /// Finished normally (terminal).
    Completed,
    /// Abandoned by an operator (terminal).
    Abandoned,
}

impl BatchStatus {
    /// Returns `true` for `Completed`, `Failed`, `Stopped` and `Abandoned`.
    ///
    /// # Example
    /// ```
    /// use batchvisor::BatchStatus;
    ///
    /// assert!(BatchStatus::Abandoned.is_terminal());
    /// assert!(!BatchStatus::Stopping.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed
                | BatchStatus::Failed
                | BatchStatus::Stopped
                | BatchStatus::Abandoned
        )
    }

    /// Returns the upper-case status name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Starting => "STARTING",
            BatchStatus::Started => "STARTED",
            BatchStatus::Stopping => "STOPPING",
            BatchStatus::Stopped => "STOPPED",
            BatchStatus::Failed => "FAILED",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Abandoned => "ABANDONED",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
