//! Exit code constants for the simplelock CLI.
//!
//! - 0: Success (including a lock push that lost a race, which is only a warning)
//! - 1: User error (bad path argument, zero or partial unlock match)
//! - 2: Configuration error (no lock repository configured)
//! - 3: Git operation failure (pull, commit)
//! - 4: Lock conflict (a requested file is already locked)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an unlock request that did not fully match.
pub const USER_ERROR: i32 = 1;

/// Configuration error: the lock repository is missing or unusable.
pub const CONFIG_ERROR: i32 = 2;

/// Git operation failure: fetch, merge, commit or strip errors.
pub const GIT_FAILURE: i32 = 3;

/// Lock conflict: a requested file is already locked.
pub const LOCK_CONFLICT: i32 = 4;
