//! Config struct definition and default implementation.

use serde::{Deserialize, Serialize};

/// Default remote of the registry mirror.
pub const DEFAULT_REMOTE: &str = "origin";

/// Purpose recorded when `lock` is run without `--purpose`.
pub const DEFAULT_PURPOSE: &str = "editing";

/// Repository-local file declaring lockable file patterns.
pub const DEFAULT_LOCKABLES_FILE: &str = ".hglocks";

/// Configuration for simplelock.
///
/// Field names are the git config variable names below `simplelock.`
/// (git reports them lowercased).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the local clone of the shared lock repository (required).
    pub repo: Option<String>,

    /// Remote of the lock repository clone that holds the published registry.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch of the lock repository; defaults to the branch checked out in the clone.
    pub branch: Option<String>,

    /// Lock owner name; defaults to the git identity.
    pub username: Option<String>,

    /// Purpose recorded when none is given on the command line.
    #[serde(default = "default_purpose")]
    pub purpose: String,

    /// Name of the lockable-patterns file at the repository root.
    #[serde(default = "default_lockables")]
    pub lockables: String,
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_purpose() -> String {
    DEFAULT_PURPOSE.to_string()
}

fn default_lockables() -> String {
    DEFAULT_LOCKABLES_FILE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: None,
            remote: default_remote(),
            branch: None,
            username: None,
            purpose: default_purpose(),
            lockables: default_lockables(),
        }
    }
}
