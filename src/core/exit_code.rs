//! # Process exit code of a job run.
//!
//! [`ExitCode::derive`] maps the terminal state of a run to the code the invoking
//! shell or scheduler sees:
//!
//! ```text
//! exit_status == "WARNING"        ─► 2   (wins even over a Failed batch status)
//! batch_status == Completed       ─► 0
//! anything else                   ─► 1   (failure, stop, abandon, interruption)
//! ```

use std::fmt;

use crate::engine::{BatchStatus, WARNING_EXIT_STATUS};

/// Exit code reported for a job run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitCode {
    /// Normal completion.
    Success = 0,
    /// Failure, interruption or abnormal termination.
    Failure = 1,
    /// The run set the `WARNING` exit status.
    Warning = 2,
}

impl ExitCode {
    /// Derives the exit code from the final batch status and exit-status string.
    ///
    /// # Example
    /// ```
    /// use batchvisor::{BatchStatus, ExitCode};
    ///
    /// assert_eq!(ExitCode::derive(BatchStatus::Completed, None), ExitCode::Success);
    /// assert_eq!(ExitCode::derive(BatchStatus::Failed, Some("WARNING")), ExitCode::Warning);
    /// assert_eq!(ExitCode::derive(BatchStatus::Stopped, Some("STOPPED")), ExitCode::Failure);
    /// ```
    pub fn derive(batch_status: BatchStatus, exit_status: Option<&str>) -> Self {
        if exit_status == Some(WARNING_EXIT_STATUS) {
            ExitCode::Warning
        } else if batch_status == BatchStatus::Completed {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }

    /// Returns the numeric process exit code.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
