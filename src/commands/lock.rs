//! Implementation of the `simplelock lock` command.

use crate::cli::LockArgs;
use crate::engine;
use crate::error::Result;
use crate::paths::normalize_targets;
use std::path::Path;

/// Execute the `simplelock lock` command.
///
/// # Returns
///
/// * `Ok(())` - The locks were published, or the push lost a race (a
///   warning names the current holders)
/// * `Err(SimpleLockError::LockConflict)` - A file is already locked (exit code 4)
pub fn cmd_lock(lock_repo: Option<&Path>, args: LockArgs) -> Result<()> {
    let (ctx, cwd) = super::resolve(lock_repo)?;
    let targets = normalize_targets(&ctx.repo_root, &cwd, &args.files)?;

    let outcome = engine::acquire(&ctx, &targets, args.purpose.as_deref())?;

    super::report_rejection("Lock", &outcome.status);
    if outcome.status.is_published() {
        for record in &outcome.records {
            println!("Locked {} for {}", record.path, record.purpose);
        }
    }
    Ok(())
}
