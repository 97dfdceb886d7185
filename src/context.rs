//! Invocation context resolution for simplelock.
//!
//! Every lock operation receives a [`LockContext`] that carries everything the
//! core logic needs to know about its environment: the working repository,
//! its identity and branch, the acting user and where the lock registry
//! lives. It is resolved once per invocation; nothing below this layer looks
//! at git config, environment variables or the current directory.

use crate::config::Config;
use crate::error::{Result, SimpleLockError};
use crate::git;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which repository and branch a set of lock records belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockScope {
    /// Root commit hash of the working repository.
    pub repo_id: String,

    /// Branch checked out in the working repository.
    pub branch: String,
}

/// Where the shared lock registry is reached from this machine.
#[derive(Debug, Clone)]
pub struct RegistryLocation {
    /// Local clone of the lock repository.
    pub mirror: PathBuf,

    /// Remote of the clone holding the published registry.
    pub remote: String,

    /// Registry branch; `None` uses the branch checked out in the clone.
    pub branch: Option<String>,
}

/// Resolved environment for one simplelock invocation.
#[derive(Debug, Clone)]
pub struct LockContext {
    /// Absolute path to the working repository root.
    pub repo_root: PathBuf,

    /// Repository identity and branch used to key lock records.
    pub scope: LockScope,

    /// Lock owner recorded for new locks and checked on unlock.
    pub username: String,

    /// Location of the lock registry.
    pub registry: RegistryLocation,

    /// Name of the lockable-patterns file at the repository root.
    pub lockables_file: String,

    /// Purpose recorded when none is given.
    pub default_purpose: String,
}

impl LockContext {
    /// Resolve the context for an invocation from `cwd`.
    ///
    /// `lock_repo` overrides the configured lock repository.
    ///
    /// # Returns
    ///
    /// * `Ok(LockContext)` - Successfully resolved context
    /// * `Err(SimpleLockError::UserError)` - If not in a git repository (exit code 1)
    /// * `Err(SimpleLockError::ConfigError)` - If no lock repository is configured (exit code 2)
    pub fn resolve_from<P: AsRef<Path>>(cwd: P, lock_repo: Option<&Path>) -> Result<Self> {
        let repo_root = git::get_repo_root(cwd.as_ref())?;

        let config = Config::load(&repo_root)?.with_repo_override(lock_repo);
        config.validate()?;

        let mirror = config.mirror_path(&repo_root)?;
        let scope = LockScope {
            repo_id: git::root_commit(&repo_root)?,
            branch: git::current_branch(&repo_root)?,
        };
        let username = resolve_username(&repo_root, &config)?;

        let ctx = Self {
            repo_root,
            scope,
            username,
            registry: RegistryLocation {
                mirror,
                remote: config.remote,
                branch: config.branch,
            },
            lockables_file: config.lockables,
            default_purpose: config.purpose,
        };
        debug!(?ctx, "resolved lock context");
        Ok(ctx)
    }
}

/// Lock owner: `simplelock.username`, then the git identity, then `user@host`.
fn resolve_username(repo_root: &Path, config: &Config) -> Result<String> {
    let username = match &config.username {
        Some(name) => name.clone(),
        None => git::user_identity(repo_root)?.unwrap_or_else(fallback_owner_string),
    };

    if username.contains(['\t', '\n', '\r']) {
        return Err(SimpleLockError::ConfigError(format!(
            "username '{}' contains tabs or newlines; set simplelock.username to a plain name",
            username.escape_debug()
        )));
    }

    Ok(username)
}

/// Owner string used when git has no identity configured.
fn fallback_owner_string() -> String {
    let user = env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
