//! Error types for todo-list
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid task fields, unknown task)
//! - 3: Blocked by policy (destructive command without confirmation)
//! - 4: Operation failed (storage write, import, io)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the todo CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for todo-list operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid task: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Policy blocks (exit code 3)
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    // Operation failures (exit code 4)
    #[error("Failed to write task storage: {0}")]
    StorageWrite(String),

    #[error("Import rejected: {0}")]
    ImportValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::Validation(_)
            | Error::TaskNotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::ConfirmationRequired(_) => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::StorageWrite(_)
            | Error::ImportValidation(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output, when the error carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::LockFailed(path) => Some(serde_json::json!({ "lock": path })),
            _ => None,
        }
    }
}

/// Result type alias for todo-list operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(
            Error::Validation("title".to_string()).exit_code(),
            exit_codes::USER_ERROR
        );
        assert_eq!(
            Error::ConfirmationRequired("rm".to_string()).exit_code(),
            exit_codes::POLICY_BLOCKED
        );
        assert_eq!(
            Error::StorageWrite("disk full".to_string()).exit_code(),
            exit_codes::OPERATION_FAILED
        );
    }

    #[test]
    fn not_found_carries_id_details() {
        let err = Error::TaskNotFound("abc".to_string());
        let details = err.details().expect("details");
        assert_eq!(details["id"], "abc");
        assert!(Error::Validation("x".to_string()).details().is_none());
    }
}
