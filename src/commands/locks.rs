//! Implementation of the `simplelock locks` command.

use crate::cli::LocksArgs;
use crate::engine::{self, ListEntry, ListOptions};
use crate::error::{Result, SimpleLockError};
use crate::paths::PathFilter;
use std::path::Path;

/// Execute the `simplelock locks` command.
///
/// Prints one line per locked file (`X is locked by U for P`) and, with
/// `--unlocked`, one per unheld lockable file (`X is unlocked`), sorted by
/// path. Nothing is printed when no file qualifies.
pub fn cmd_locks(lock_repo: Option<&Path>, args: LocksArgs) -> Result<()> {
    let (ctx, cwd) = super::resolve(lock_repo)?;
    let filter = PathFilter::new(&ctx.repo_root, &cwd, &args.patterns)?;

    let entries = engine::list(
        &ctx,
        &ListOptions {
            unlocked: args.unlocked,
            filter,
        },
    )?;

    let rendered = render(&entries, args.json)?;
    if !rendered.is_empty() {
        println!("{}", rendered);
    }
    Ok(())
}

pub(super) fn render(entries: &[ListEntry], json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(entries).map_err(|e| {
            SimpleLockError::UserError(format!("failed to serialize lock listing: {}", e))
        });
    }

    Ok(entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}
