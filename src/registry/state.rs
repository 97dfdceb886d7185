//! Reading the current lock state for one repository and branch.

use super::codec::parse_registry;
use crate::context::LockScope;
use crate::error::{Result, SimpleLockError};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Who holds a lock and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolder {
    pub owner: String,
    pub purpose: String,
}

/// Locked paths of one repository and branch, ordered by path.
pub type LockMap = BTreeMap<String, LockHolder>;

/// Read the locks recorded for `scope` from the registry file.
///
/// A registry file that does not exist yet means no locks are held; a
/// warning is logged and an empty map returned. Records for other
/// repositories or branches are dropped. If a path appears more than once,
/// the last record wins.
pub fn parse_locks(registry_file: &Path, scope: &LockScope) -> Result<LockMap> {
    if !registry_file.exists() {
        warn!(
            file = %registry_file.display(),
            "lock registry file not present, no locks held"
        );
        return Ok(LockMap::new());
    }

    let content = fs::read_to_string(registry_file).map_err(|e| {
        SimpleLockError::UserError(format!(
            "failed to read lock registry '{}': {}",
            registry_file.display(),
            e
        ))
    })?;

    let parsed = parse_registry(&content);
    if parsed.skipped > 0 {
        warn!(
            skipped = parsed.skipped,
            file = %registry_file.display(),
            "ignored malformed lock registry lines"
        );
    }

    Ok(parsed
        .records
        .into_iter()
        .filter(|record| record.in_scope(scope))
        .map(|record| {
            (
                record.path,
                LockHolder {
                    owner: record.owner,
                    purpose: record.purpose,
                },
            )
        })
        .collect())
}
