//! Command implementations for simplelock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Commands resolve the invocation context, turn file
//! arguments into repository-relative paths, run the lock engine and print
//! the outcome.

mod lock;
mod locks;
mod unlock;


use crate::cli::{Cli, Command};
use crate::context::LockContext;
use crate::engine::PublishStatus;
use crate::error::{Result, SimpleLockError};
use std::env;
use std::path::{Path, PathBuf};

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let lock_repo = cli.lock_repo.as_deref();
    match cli.command {
        Command::Locks(args) => locks::cmd_locks(lock_repo, args),
        Command::Lock(args) => lock::cmd_lock(lock_repo, args),
        Command::Unlock(args) => unlock::cmd_unlock(lock_repo, args),
    }
}

/// Resolve the context for the current directory, which is also returned
/// because file arguments are relative to it.
fn resolve(lock_repo: Option<&Path>) -> Result<(LockContext, PathBuf)> {
    let cwd = env::current_dir().map_err(|e| {
        SimpleLockError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    let ctx = LockContext::resolve_from(&cwd, lock_repo)?;
    Ok((ctx, cwd))
}

/// Print the retry warning for a lost push race, with who holds the files now.
fn report_rejection(action: &str, status: &PublishStatus) {
    let PublishStatus::Rejected { reason, current } = status else {
        return;
    };

    eprintln!("{} push failed, please retry", action);
    tracing::debug!(%reason, "push rejected");

    match current {
        Some(current) => {
            for (path, holder) in current {
                eprintln!(
                    "  {} is now locked by {} for {}",
                    path, holder.owner, holder.purpose
                );
            }
        }
        None => {
            eprintln!("Warning: could not re-read the lock registry; run `simplelock locks` to check");
        }
    }
}
