//! Error types for the task journal.
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown id, bad argument, unknown context)
//! - 4: Operation failed (file read/write/parse, inconsistent workspace)

use thiserror::Error;

use crate::fields::Status;
use crate::identity::TaskId;

/// Exit codes for the `todo` binary
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Direction of a status transition, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Next => f.write_str("next"),
            Direction::Previous => f.write_str("previous"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("The task {0} does not exist")]
    NotFound(TaskId),

    #[error("A task with usage id {0} already exists")]
    AlreadyExists(TaskId),

    #[error("The status '{status}' has no {direction} state")]
    InvalidTransition { status: Status, direction: Direction },

    #[error("The parent links form a cycle through tasks {0:?}")]
    CycleDetected(Vec<TaskId>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The context {0} does not exist")]
    ContextNotFound(String),

    #[error("The context {0} already exists")]
    ContextExists(String),

    #[error("The task {0} has no associated note")]
    NoNote(TaskId),

    #[error("{failed} of {total} tasks could not be processed")]
    PartialFailure { failed: usize, total: usize },

    // Operation failures (exit code 4)
    #[error("The workspace has {0} integrity problem(s)")]
    Inconsistent(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_)
            | Error::AlreadyExists(_)
            | Error::InvalidTransition { .. }
            | Error::CycleDetected(_)
            | Error::InvalidArgument(_)
            | Error::ContextNotFound(_)
            | Error::ContextExists(_)
            | Error::NoNote(_)
            | Error::PartialFailure { .. } => exit_codes::USER_ERROR,

            Error::Inconsistent(_) | Error::Io(_) | Error::Json(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for journal operations
pub type Result<T> = std::result::Result<T, Error>;
