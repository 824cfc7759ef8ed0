//! Error types for sysmedic.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedicError {
    /// Fix rejected before execution: structurally unsound or denylisted.
    #[error("invalid fix: {reason}")]
    InvalidFix { reason: String },

    /// Fix needs an elevated context and the caller has none. Never retried.
    #[error("fix '{title}' requires root privileges")]
    PermissionDenied { title: String },

    /// A command in a fix sequence exited non-zero or could not be spawned.
    /// Recoverable through the optional rollback path.
    #[error("command {index} failed: '{command}' (exit {code})")]
    CommandFailed {
        index: usize,
        command: String,
        code: i32,
    },
}

impl MedicError {
    pub fn invalid_fix(reason: impl Into<String>) -> Self {
        MedicError::InvalidFix {
            reason: reason.into(),
        }
    }
}
