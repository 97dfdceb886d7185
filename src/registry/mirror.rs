//! The local mirror of the lock registry.
//!
//! A mirror is a disposable clone of the lock repository. It is never a
//! source of truth: before every read or write it is forced back to exactly
//! the published state with [`Mirror::force_sync`], discarding any local
//! divergence instead of merging it. Changes are published with
//! [`Mirror::publish`]; a rejected push is the only signal that another
//! client changed the registry first.

use super::REGISTRY_FILE;
use crate::context::RegistryLocation;
use crate::error::{Result, SimpleLockError};
use crate::git::{self, run_git};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What [`Mirror::force_sync`] had to do to converge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Uncommitted or untracked files were thrown away.
    pub discarded_changes: bool,

    /// Local commits that were not published and have been removed.
    pub stripped: Vec<String>,

    /// Published tip after the sync, `None` while the registry has no history.
    pub tip: Option<String>,
}

/// Result of trying to publish a local registry change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The change is now part of the published registry.
    Published,

    /// The push was refused (usually because the registry moved on).
    /// The change exists only in the local mirror.
    Rejected { reason: String },
}

/// A local clone of the lock repository.
#[derive(Debug, Clone)]
pub struct Mirror {
    path: PathBuf,
    remote: String,
    branch: String,
}

impl Mirror {
    /// Open the mirror described by `location`.
    ///
    /// # Returns
    ///
    /// * `Ok(Mirror)` - The clone exists and has the configured remote
    /// * `Err(SimpleLockError::ConfigError)` - The path is not a git clone, has
    ///   no such remote, or no registry branch can be determined
    pub fn open(location: &RegistryLocation) -> Result<Self> {
        let path = location.mirror.clone();

        if !git::is_work_tree_root(&path) {
            return Err(SimpleLockError::ConfigError(format!(
                "lock repository '{}' is not a git clone.\n\n\
                 Clone the shared lock repository there, or point simplelock.repo at an existing clone.",
                path.display()
            )));
        }

        if git::try_run_git(&path, &["remote", "get-url", &location.remote])?.is_none() {
            return Err(SimpleLockError::ConfigError(format!(
                "lock repository '{}' has no remote named '{}' (see simplelock.remote)",
                path.display(),
                location.remote
            )));
        }

        let branch = match &location.branch {
            Some(branch) => branch.clone(),
            None => git::current_branch(&path)?,
        };
        if branch == "HEAD" {
            return Err(SimpleLockError::ConfigError(format!(
                "lock repository '{}' has a detached HEAD; check out the registry branch or set simplelock.branch",
                path.display()
            )));
        }

        Ok(Self {
            path,
            remote: location.remote.clone(),
            branch,
        })
    }

    /// Path of the clone.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registry branch being tracked.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Path of the registry file in the clone's working copy.
    pub fn registry_file(&self) -> PathBuf {
        self.path.join(REGISTRY_FILE)
    }

    fn tracking_ref(&self) -> String {
        format!("refs/remotes/{}/{}", self.remote, self.branch)
    }

    /// Make the working copy equal to the published registry.
    ///
    /// 1. Uncommitted and untracked changes are discarded.
    /// 2. The remote is fetched; a failure here is returned as an error and
    ///    the caller must not use the (stale) registry.
    /// 3. If the remote has branches but not the registry branch, the
    ///    configuration is wrong and a config error is returned.
    /// 4. Local commits that no remote branch contains are stripped and the
    ///    working copy is moved to the published tip.
    ///
    /// Afterwards the registry file is byte-identical to the published one as
    /// of the fetch. Divergence is never merged.
    pub fn force_sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        if git::has_uncommitted_changes(&self.path)? || git::has_untracked_files(&self.path)? {
            info!(mirror = %self.path.display(), "discarding uncommitted changes in lock repository");
            self.discard_working_changes()?;
            report.discarded_changes = true;
        }

        self.fetch()?;
        let upstream = git::resolve_rev(&self.path, &self.tracking_ref())?;
        if upstream.is_none() && self.remote_has_branches()? {
            return Err(SimpleLockError::ConfigError(format!(
                "lock repository remote '{}' has no branch '{}' (see simplelock.branch)",
                self.remote, self.branch
            )));
        }

        let outgoing = self.outgoing()?;
        if !outgoing.is_empty() {
            warn!(count = outgoing.len(), "stripping local commits not in public lock repo");
            report.stripped = outgoing;
        }

        match &upstream {
            Some(upstream) => self.update_to(upstream)?,
            None if !report.stripped.is_empty() => self.reset_to_unborn()?,
            None => {}
        }

        debug!(tip = ?upstream, "lock repository synchronized");
        report.tip = upstream;
        Ok(report)
    }

    /// Commit the registry file and push it.
    ///
    /// A failed commit is an error. A failed push is reported as
    /// [`PublishOutcome::Rejected`]; the commit then stays local until the
    /// next [`Mirror::force_sync`] strips it.
    pub fn publish(&self, message: &str) -> Result<PublishOutcome> {
        run_git(&self.path, &["add", "--", REGISTRY_FILE])?;
        run_git(&self.path, &["commit", "-q", "-m", message])?;

        let refspec = format!("HEAD:refs/heads/{}", self.branch);
        match run_git(&self.path, &["push", "-q", &self.remote, &refspec]) {
            Ok(_) => {
                info!(message, "published lock registry change");
                Ok(PublishOutcome::Published)
            }
            Err(e) => {
                warn!(error = %e, "lock registry push was rejected");
                Ok(PublishOutcome::Rejected {
                    reason: e.to_string(),
                })
            }
        }
    }

    fn head(&self) -> Result<Option<String>> {
        git::resolve_rev(&self.path, "HEAD")
    }

    fn fetch(&self) -> Result<()> {
        let refspec = format!("+refs/heads/*:refs/remotes/{}/*", self.remote);
        run_git(&self.path, &["fetch", "-q", "--prune", &self.remote, &refspec])?;
        Ok(())
    }

    /// Whether the remote has any branch at all.
    fn remote_has_branches(&self) -> Result<bool> {
        let prefix = format!("refs/remotes/{}/", self.remote);
        let output = run_git(&self.path, &["for-each-ref", "--format=%(refname)", &prefix])?;
        let head = format!("{}HEAD", prefix);
        Ok(output.lines().iter().any(|name| *name != head))
    }

    /// Local commits that no branch of the remote contains.
    fn outgoing(&self) -> Result<Vec<String>> {
        if self.head()?.is_none() {
            return Ok(Vec::new());
        }

        let remotes = format!("--remotes={}", self.remote);
        let output = run_git(&self.path, &["rev-list", "HEAD", "--not", &remotes])?;
        Ok(output.lines().iter().map(|s| s.to_string()).collect())
    }

    /// Move the branch and working copy to the published tip. Commits that
    /// are not published were counted as outgoing beforehand.
    fn update_to(&self, upstream: &str) -> Result<()> {
        run_git(&self.path, &["reset", "-q", "--hard", upstream])?;
        Ok(())
    }

    /// Nothing is published yet: return to an unborn branch.
    fn reset_to_unborn(&self) -> Result<()> {
        run_git(&self.path, &["update-ref", "-d", "HEAD"])?;
        run_git(&self.path, &["read-tree", "--empty"])?;
        run_git(&self.path, &["clean", "-q", "-f", "-d"])?;
        Ok(())
    }

    fn discard_working_changes(&self) -> Result<()> {
        if self.head()?.is_some() {
            run_git(&self.path, &["reset", "-q", "--hard", "HEAD"])?;
        } else {
            run_git(&self.path, &["read-tree", "--empty"])?;
        }
        run_git(&self.path, &["clean", "-q", "-f", "-d"])?;
        Ok(())
    }
}
