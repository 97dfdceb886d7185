//! Error types for the simplelock CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for simplelock operations.
///
/// Each variant maps to a specific exit code.
#[derive(Error, Debug)]
pub enum SimpleLockError {
    /// User provided invalid arguments, or an unlock request did not match.
    #[error("{0}")]
    UserError(String),

    /// The lock repository is not configured or cannot be used.
    #[error("{0}")]
    ConfigError(String),

    /// Git operation failed (including pulling from the lock repository).
    #[error("Git operation failed: {0}")]
    GitError(String),

    /// A requested file is already locked.
    #[error("{0}")]
    LockConflict(String),
}

impl SimpleLockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimpleLockError::UserError(_) => exit_codes::USER_ERROR,
            SimpleLockError::ConfigError(_) => exit_codes::CONFIG_ERROR,
            SimpleLockError::GitError(_) => exit_codes::GIT_FAILURE,
            SimpleLockError::LockConflict(_) => exit_codes::LOCK_CONFLICT,
        }
    }
}

/// Result type alias for simplelock operations.
pub type Result<T> = std::result::Result<T, SimpleLockError>;
