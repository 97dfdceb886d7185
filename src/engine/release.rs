//! Releasing locks.

use super::{PublishStatus, commit_message, publish, reconcile, unique_targets};
use crate::context::LockContext;
use crate::error::{Result, SimpleLockError};
use crate::fs::atomic_write_file;
use crate::registry::LockRecord;
use std::collections::BTreeSet;
use std::fs;
use tracing::info;

/// Result of an unlock request that matched every target.
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    /// Records removed from the registry.
    pub cleared: Vec<LockRecord>,

    /// Whether the removal was published.
    pub status: PublishStatus,
}

/// Remove the locks on `targets` (repository-relative paths).
///
/// A record is removed when it belongs to this repository and branch, names
/// one of the targets, and is owned by the context's user (any owner with
/// `force`). Unless every target is matched, nothing is changed and a
/// [`SimpleLockError::UserError`] says whether none or only some matched.
/// Lines of other repositories and malformed lines are preserved as-is.
pub fn release(ctx: &LockContext, targets: &[String], force: bool) -> Result<ReleaseOutcome> {
    let targets = unique_targets(targets)?;
    let mirror = reconcile(ctx)?;
    let registry_file = mirror.registry_file();

    let content = if registry_file.exists() {
        fs::read_to_string(&registry_file).map_err(|e| {
            SimpleLockError::UserError(format!(
                "failed to read lock registry '{}': {}",
                registry_file.display(),
                e
            ))
        })?
    } else {
        String::new()
    };

    let mut kept = String::with_capacity(content.len());
    let mut cleared = Vec::new();
    let mut held_by_others = Vec::new();

    for line in content.split_inclusive('\n') {
        if let Some(record) = LockRecord::decode(line)
            && record.in_scope(&ctx.scope)
            && targets.contains(&record.path)
        {
            if force || record.owner == ctx.username {
                cleared.push(record);
                continue;
            }
            held_by_others.push(record);
        }
        kept.push_str(line);
    }

    let cleared_paths: BTreeSet<&str> = cleared.iter().map(|r| r.path.as_str()).collect();
    if cleared_paths.len() != targets.len() {
        return Err(mismatch_error(
            cleared_paths.len(),
            targets.len(),
            &held_by_others,
        ));
    }

    atomic_write_file(&registry_file, &kept)?;
    info!(count = cleared.len(), force, "removed lock records");

    let status = publish(
        ctx,
        &mirror,
        &commit_message("remove lock", &targets),
        &targets,
    )?;
    Ok(ReleaseOutcome { cleared, status })
}

fn mismatch_error(cleared: usize, requested: usize, held_by_others: &[LockRecord]) -> SimpleLockError {
    let mut msg = if cleared == 0 {
        if requested == 1 {
            "No locks found for specified file".to_string()
        } else {
            "No locks found for specified files".to_string()
        }
    } else {
        format!("Only {} of {} files were locked", cleared, requested)
    };

    for record in held_by_others {
        msg.push_str(&format!(
            "\n{} is locked by {}; use --force to unlock it anyway",
            record.path, record.owner
        ));
    }

    SimpleLockError::UserError(msg)
}
