//! Git command runner for simplelock.
//!
//! Provides a safe wrapper around git commands with captured stdout/stderr
//! and structured error handling. Both the working repository and the lock
//! registry mirror are driven through this module.

use crate::error::{Result, SimpleLockError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    /// Create a new GitOutput from raw output bytes.
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Returns true if stdout is empty.
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty()
    }

    /// Returns stdout lines as a vector.
    pub fn lines(&self) -> Vec<&str> {
        if self.stdout.is_empty() {
            Vec::new()
        } else {
            self.stdout.lines().collect()
        }
    }

    /// Returns the error text git printed, preferring stderr.
    fn message(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

fn spawn_git(cwd: &Path, args: &[&str]) -> Result<Output> {
    debug!(cwd = %cwd.display(), args = ?args, "running git");
    Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .map_err(|e| {
            SimpleLockError::GitError(format!(
                "failed to execute git {}: {}",
                args.first().unwrap_or(&""),
                e
            ))
        })
}

/// Run a git command with the specified working directory.
///
/// # Returns
///
/// * `Ok(GitOutput)` - On successful execution (exit code 0)
/// * `Err(SimpleLockError::GitError)` - On non-zero exit code (mapped to exit code 3)
pub fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    let output = spawn_git(cwd.as_ref(), args)?;
    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(git_output)
    } else {
        let exit_code = output.status.code().unwrap_or(-1);
        Err(SimpleLockError::GitError(format!(
            "git {} failed (exit code {}): {}",
            args.first().unwrap_or(&""),
            exit_code,
            git_output.message()
        )))
    }
}

/// Run a git command whose non-zero exit is an expected answer rather than
/// a failure (e.g. `git config --get` on an unset key).
///
/// Returns `Ok(None)` on non-zero exit; failing to spawn git is still an error.
pub fn try_run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<Option<GitOutput>> {
    let output = spawn_git(cwd.as_ref(), args)?;
    if output.status.success() {
        Ok(Some(GitOutput::from_output(&output)))
    } else {
        Ok(None)
    }
}

/// Get the repository root directory using `git rev-parse --show-toplevel`.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The absolute path to the repository root
/// * `Err(SimpleLockError::UserError)` - If not inside a git repository (exit code 1)
pub fn get_repo_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let output = run_git_for_repo_detection(cwd.as_ref(), &["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(&output.stdout))
}

/// Internal helper that returns a UserError instead of GitError for repo detection.
/// This ensures "not in a git repo" is a clean user error (exit 1) not a git error (exit 3).
fn run_git_for_repo_detection(cwd: &Path, args: &[&str]) -> Result<GitOutput> {
    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .map_err(|e| {
            SimpleLockError::UserError(format!(
                "failed to execute git: {} (is git installed?)",
                e
            ))
        })?;

    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(git_output)
    } else if git_output.stderr.contains("not a git repository")
        || git_output.stderr.contains("fatal:")
    {
        Err(SimpleLockError::UserError(
            "not inside a git repository. Run this command from within a git repository."
                .to_string(),
        ))
    } else {
        Err(SimpleLockError::UserError(format!(
            "git command failed: {}",
            git_output.message()
        )))
    }
}

/// Check whether `path` is the top level of a git work tree.
pub fn is_work_tree_root<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if !path.is_dir() {
        return false;
    }
    match get_repo_root(path) {
        Ok(root) => match (root.canonicalize(), path.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
        Err(_) => false,
    }
}

/// Check if the working directory has uncommitted tracked changes.
///
/// Uses `git status --porcelain --untracked-files=no`.
pub fn has_uncommitted_changes<P: AsRef<Path>>(cwd: P) -> Result<bool> {
    let output = run_git(cwd, &["status", "--porcelain", "--untracked-files=no"])?;
    Ok(!output.is_empty())
}

/// Check if the working directory contains untracked (non-ignored) files.
pub fn has_untracked_files<P: AsRef<Path>>(cwd: P) -> Result<bool> {
    let output = run_git(cwd, &["ls-files", "--others", "--exclude-standard"])?;
    Ok(!output.is_empty())
}

/// Read a single git config value, `None` when unset.
pub fn config_get<P: AsRef<Path>>(cwd: P, key: &str) -> Result<Option<String>> {
    Ok(try_run_git(cwd, &["config", "--get", key])?.map(|out| out.stdout))
}

/// Read every git config entry whose key matches `pattern`.
///
/// Keys are returned lowercased (git normalizes section and variable names).
pub fn config_entries<P: AsRef<Path>>(cwd: P, pattern: &str) -> Result<Vec<(String, String)>> {
    let Some(output) = try_run_git(cwd, &["config", "--get-regexp", pattern])? else {
        return Ok(Vec::new());
    };

    Ok(output
        .lines()
        .into_iter()
        .map(|line| match line.split_once(' ') {
            Some((key, value)) => (key.to_ascii_lowercase(), value.to_string()),
            None => (line.to_ascii_lowercase(), String::new()),
        })
        .collect())
}

/// Name of the branch checked out in `cwd`.
///
/// Works on an unborn branch; a detached HEAD reports `HEAD`.
pub fn current_branch<P: AsRef<Path>>(cwd: P) -> Result<String> {
    match try_run_git(cwd, &["symbolic-ref", "--quiet", "--short", "HEAD"])? {
        Some(output) if !output.is_empty() => Ok(output.stdout),
        _ => Ok("HEAD".to_string()),
    }
}

/// Resolve a revision to a full object id, `None` if it does not exist.
pub fn resolve_rev<P: AsRef<Path>>(cwd: P, rev: &str) -> Result<Option<String>> {
    let spec = format!("{}^{{commit}}", rev);
    Ok(try_run_git(cwd, &["rev-parse", "--verify", "--quiet", &spec])?.map(|out| out.stdout))
}

/// Hash of the oldest parentless commit reachable from HEAD.
///
/// This identifies a repository across all of its clones.
pub fn root_commit<P: AsRef<Path>>(cwd: P) -> Result<String> {
    let cwd = cwd.as_ref();
    if resolve_rev(cwd, "HEAD")?.is_none() {
        return Err(SimpleLockError::UserError(format!(
            "repository '{}' has no commits yet; locks are keyed by the root commit.\n\
             Commit something first.",
            cwd.display()
        )));
    }

    let output = run_git(cwd, &["rev-list", "--max-parents=0", "--reverse", "HEAD"])?;
    output
        .lines()
        .first()
        .map(|s| s.to_string())
        .ok_or_else(|| SimpleLockError::GitError("could not determine root commit".to_string()))
}

/// Resolve the committer identity as `Name <email>`, or just the name.
pub fn user_identity<P: AsRef<Path>>(cwd: P) -> Result<Option<String>> {
    let cwd = cwd.as_ref();
    let name = config_get(cwd, "user.name")?.filter(|n| !n.is_empty());
    let email = config_get(cwd, "user.email")?.filter(|e| !e.is_empty());

    Ok(match (name, email) {
        (Some(name), Some(email)) => Some(format!("{} <{}>", name, email)),
        (Some(name), None) => Some(name),
        (None, Some(email)) => Some(email),
        (None, None) => None,
    })
}

/// Every tracked file in the work tree, repository-relative with forward slashes.
pub fn tracked_files<P: AsRef<Path>>(repo_root: P) -> Result<Vec<String>> {
    let output = run_git(repo_root, &["ls-files", "-z", "--full-name"])?;
    Ok(output
        .stdout
        .split('\0')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect())
}
