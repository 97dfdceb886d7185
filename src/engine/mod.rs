//! Lock operations: acquire, release and list.
//!
//! Every operation starts by forcing the registry mirror to the published
//! state, so each decision is made against current data. Mutating operations
//! then change the registry file, commit and push. The push is the only
//! mutual exclusion there is: when two clients race, the registry accepts
//! the first push and rejects the other. A rejected client re-synchronizes
//! immediately (dropping its unpublished change) and reports who holds the
//! requested files now, leaving the decision to retry to the caller.

mod acquire;
mod list;
mod release;


pub use acquire::{AcquireOutcome, acquire};
pub use list::{ListEntry, ListOptions, list};
pub use release::{ReleaseOutcome, release};

use crate::context::LockContext;
use crate::error::{Result, SimpleLockError};
use crate::registry::{LockMap, Mirror, PublishOutcome, parse_locks};
use tracing::{debug, warn};

/// What happened to a registry change after it was written locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// The change is published.
    Published,

    /// Another client changed the registry first; the change was dropped.
    Rejected {
        /// Why the push failed.
        reason: String,

        /// Current locks on the requested paths after re-synchronizing, or
        /// `None` if the registry could not be read again.
        current: Option<LockMap>,
    },
}

impl PublishStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishStatus::Published)
    }
}

/// Open the mirror and force it to the published state.
fn reconcile(ctx: &LockContext) -> Result<Mirror> {
    let mirror = Mirror::open(&ctx.registry)?;
    let report = mirror.force_sync()?;
    debug!(
        mirror = %mirror.path().display(),
        branch = mirror.branch(),
        tip = report.tip.as_deref().unwrap_or("(none)"),
        stripped = report.stripped.len(),
        discarded = report.discarded_changes,
        "lock registry reconciled"
    );
    Ok(mirror)
}

fn read_state(ctx: &LockContext, mirror: &Mirror) -> Result<LockMap> {
    parse_locks(&mirror.registry_file(), &ctx.scope)
}

/// Publish the mirror's registry file; on rejection, re-synchronize and
/// report the current holders of `targets`.
fn publish(
    ctx: &LockContext,
    mirror: &Mirror,
    message: &str,
    targets: &[String],
) -> Result<PublishStatus> {
    match mirror.publish(message)? {
        PublishOutcome::Published => Ok(PublishStatus::Published),
        PublishOutcome::Rejected { reason } => {
            let current = match mirror.force_sync().and_then(|_| read_state(ctx, mirror)) {
                Ok(locks) => Some(
                    locks
                        .into_iter()
                        .filter(|(path, _)| targets.contains(path))
                        .collect(),
                ),
                Err(e) => {
                    warn!(error = %e, "could not re-read lock registry after rejected push");
                    None
                }
            };
            Ok(PublishStatus::Rejected { reason, current })
        }
    }
}

/// Drop repeated paths, keeping first-seen order; at least one path is required.
fn unique_targets(targets: &[String]) -> Result<Vec<String>> {
    let mut unique: Vec<String> = Vec::with_capacity(targets.len());
    for target in targets {
        if !unique.contains(target) {
            unique.push(target.clone());
        }
    }

    if unique.is_empty() {
        return Err(SimpleLockError::UserError(
            "no files specified".to_string(),
        ));
    }
    Ok(unique)
}

fn commit_message(action: &str, targets: &[String]) -> String {
    format!("{}\n\n{}\n", action, targets.join("\n"))
}
