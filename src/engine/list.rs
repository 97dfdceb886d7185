//! Listing locked and lockable files.

use super::{read_state, reconcile};
use crate::context::LockContext;
use crate::error::Result;
use crate::lockables::read_lockables;
use crate::paths::PathFilter;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Options for [`list`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Also report declared lockable files that nobody holds.
    pub unlocked: bool,

    /// Only report matching paths.
    pub filter: Option<PathFilter>,
}

/// One line of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub path: String,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.owner, &self.purpose) {
            (Some(owner), Some(purpose)) if self.locked => {
                write!(f, "{} is locked by {} for {}", self.path, owner, purpose)
            }
            _ => write!(f, "{} is unlocked", self.path),
        }
    }
}

/// Locked files (and, with `unlocked`, declared lockable files), sorted by path.
///
/// The order does not depend on `unlocked`, so a listing without it is
/// always a subsequence of the listing with it.
pub fn list(ctx: &LockContext, options: &ListOptions) -> Result<Vec<ListEntry>> {
    let mirror = reconcile(ctx)?;
    let locks = read_state(ctx, &mirror)?;

    let lockables = if options.unlocked {
        read_lockables(&ctx.repo_root, &ctx.lockables_file)?
    } else {
        Vec::new()
    };

    let paths: BTreeSet<&str> = locks
        .keys()
        .map(String::as_str)
        .chain(lockables.iter().map(String::as_str))
        .filter(|path| options.filter.as_ref().is_none_or(|f| f.matches(path)))
        .collect();

    Ok(paths
        .into_iter()
        .filter_map(|path| match locks.get(path) {
            Some(holder) => Some(ListEntry {
                path: path.to_string(),
                locked: true,
                owner: Some(holder.owner.clone()),
                purpose: Some(holder.purpose.clone()),
            }),
            None if options.unlocked => Some(ListEntry {
                path: path.to_string(),
                locked: false,
                owner: None,
                purpose: None,
            }),
            None => None,
        })
        .collect())
}
