//! Implementation of the `simplelock unlock` command.

use crate::cli::UnlockArgs;
use crate::engine;
use crate::error::Result;
use crate::paths::normalize_targets;
use std::path::Path;

/// Execute the `simplelock unlock` command.
///
/// Fails with a user error, leaving the registry untouched, unless every
/// file was locked (by the current user, or by anyone with `--force`).
pub fn cmd_unlock(lock_repo: Option<&Path>, args: UnlockArgs) -> Result<()> {
    let (ctx, cwd) = super::resolve(lock_repo)?;
    let targets = normalize_targets(&ctx.repo_root, &cwd, &args.files)?;

    let outcome = engine::release(&ctx, &targets, args.force)?;

    super::report_rejection("Unlock", &outcome.status);
    if outcome.status.is_published() {
        for record in &outcome.cleared {
            if record.owner == ctx.username {
                println!("Unlocked {}", record.path);
            } else {
                println!("Unlocked {} (was locked by {})", record.path, record.owner);
            }
        }
    }
    Ok(())
}
