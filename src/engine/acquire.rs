//! Acquiring locks.

use super::{PublishStatus, commit_message, publish, read_state, reconcile, unique_targets};
use crate::context::LockContext;
use crate::error::{Result, SimpleLockError};
use crate::registry::LockRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Result of a lock request that passed validation.
#[derive(Debug, Clone)]
pub struct AcquireOutcome {
    /// Records appended to the registry.
    pub records: Vec<LockRecord>,

    /// Whether the new records were published.
    pub status: PublishStatus,
}

/// Lock `targets` (repository-relative paths) for the context's user.
///
/// All targets are checked before anything is written: if any of them is
/// already locked in this repository and branch, the call fails with
/// [`SimpleLockError::LockConflict`] and the registry is not touched.
pub fn acquire(
    ctx: &LockContext,
    targets: &[String],
    purpose: Option<&str>,
) -> Result<AcquireOutcome> {
    let targets = unique_targets(targets)?;
    let purpose = purpose
        .filter(|p| !p.is_empty())
        .unwrap_or(ctx.default_purpose.as_str());

    let records: Vec<LockRecord> = targets
        .iter()
        .map(|path| LockRecord::new(&ctx.scope, path, &ctx.username, purpose))
        .collect();
    let lines = records
        .iter()
        .map(LockRecord::encode)
        .collect::<Result<Vec<_>>>()?;

    let mirror = reconcile(ctx)?;
    let locks = read_state(ctx, &mirror)?;

    for target in &targets {
        if let Some(holder) = locks.get(target) {
            return Err(SimpleLockError::LockConflict(format!(
                "{} is already locked by {} for {}",
                target, holder.owner, holder.purpose
            )));
        }
    }

    append_lines(&mirror.registry_file(), &lines)?;
    info!(count = records.len(), "appended lock records");

    let status = publish(ctx, &mirror, &commit_message("add lock", &targets), &targets)?;
    Ok(AcquireOutcome { records, status })
}

/// Append encoded lines, repairing a missing final newline first.
fn append_lines(registry_file: &Path, lines: &[String]) -> Result<()> {
    let needs_newline = match fs::read(registry_file) {
        Ok(existing) => existing.last().is_some_and(|&b| b != b'\n'),
        Err(_) => false,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(registry_file)
        .map_err(|e| {
            SimpleLockError::UserError(format!(
                "failed to open lock registry '{}': {}",
                registry_file.display(),
                e
            ))
        })?;

    let mut content = String::new();
    if needs_newline {
        content.push('\n');
    }
    for line in lines {
        content.push_str(line);
    }

    file.write_all(content.as_bytes()).map_err(|e| {
        SimpleLockError::UserError(format!(
            "failed to write lock registry '{}': {}",
            registry_file.display(),
            e
        ))
    })
}
