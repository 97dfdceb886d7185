//! Mapping command-line file arguments to repository-relative paths.
//!
//! Registry records store paths relative to the working repository root with
//! forward slashes, so the same file is named identically from every clone
//! and every subdirectory.

use crate::error::{Result, SimpleLockError};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};

/// Convert `arg` (relative to `cwd`, or absolute) into a repository-relative path.
///
/// `.` and `..` are folded lexically; the file does not need to exist.
pub fn repo_relative(repo_root: &Path, cwd: &Path, arg: &str) -> Result<String> {
    if arg.contains(['\t', '\n', '\r']) {
        return Err(SimpleLockError::UserError(format!(
            "path '{}' contains tabs or newlines and cannot be locked",
            arg.escape_debug()
        )));
    }

    let root = canonical_or_self(repo_root);
    let joined = canonical_or_self(cwd).join(arg);
    let absolute = fold_components(&joined);

    let relative = absolute.strip_prefix(&root).map_err(|_| {
        SimpleLockError::UserError(format!(
            "'{}' is outside repository '{}'",
            arg,
            root.display()
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        return Err(SimpleLockError::UserError(format!(
            "'{}' is the repository root, not a file",
            arg
        )));
    }

    Ok(parts.join("/"))
}

/// Normalize every argument, dropping duplicates but keeping first-seen order.
pub fn normalize_targets(repo_root: &Path, cwd: &Path, args: &[String]) -> Result<Vec<String>> {
    let mut targets: Vec<String> = Vec::with_capacity(args.len());
    for arg in args {
        let path = repo_relative(repo_root, cwd, arg)?;
        if !targets.contains(&path) {
            targets.push(path);
        }
    }
    Ok(targets)
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn fold_components(path: &Path) -> PathBuf {
    let mut folded = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other.as_os_str()),
        }
    }
    folded
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Restricts a listing to the paths named on the command line.
///
/// A pattern containing glob characters matches like a shell glob rooted at
/// the invocation directory (`*` does not cross `/`, `**` does). Any other
/// pattern names a file, or a directory and everything below it.
#[derive(Debug, Clone)]
pub struct PathFilter {
    globs: GlobSet,
    prefixes: Vec<String>,
    match_all: bool,
}

impl PathFilter {
    /// Build a filter; `None` when no patterns were given.
    pub fn new(repo_root: &Path, cwd: &Path, patterns: &[String]) -> Result<Option<Self>> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        let mut prefixes = Vec::new();
        let mut match_all = false;

        for pattern in patterns {
            let relative = match repo_relative(repo_root, cwd, pattern) {
                Ok(relative) => relative,
                // Naming the root (e.g. `.` at the top level) selects everything.
                Err(_) if canonical_or_self(&cwd.join(pattern)) == canonical_or_self(repo_root) => {
                    match_all = true;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if is_glob(&relative) {
                let glob = GlobBuilder::new(&relative)
                    .literal_separator(true)
                    .build()
                    .map_err(|e| {
                        SimpleLockError::UserError(format!(
                            "invalid pattern '{}': {}",
                            pattern, e
                        ))
                    })?;
                builder.add(glob);
            } else {
                prefixes.push(relative);
            }
        }

        let globs = builder.build().map_err(|e| {
            SimpleLockError::UserError(format!("failed to build path patterns: {}", e))
        })?;

        Ok(Some(Self {
            globs,
            prefixes,
            match_all,
        }))
    }

    /// Whether the repository-relative `path` is selected.
    pub fn matches(&self, path: &str) -> bool {
        self.match_all
            || self.globs.is_match(path)
            || self.prefixes.iter().any(|prefix| {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("art/characters")).unwrap();
        (temp_dir, root)
    }

    #[test]
    fn test_repo_relative_from_root() {
        let (_temp, root) = repo();
        assert_eq!(repo_relative(&root, &root, "foo.psd").unwrap(), "foo.psd");
        assert_eq!(repo_relative(&root, &root, "./art/hero.psd").unwrap(), "art/hero.psd");
    }

    #[test]
    fn test_repo_relative_from_subdirectory() {
        let (_temp, root) = repo();
        let cwd = root.join("art/characters");
        assert_eq!(
            repo_relative(&root, &cwd, "hero.psd").unwrap(),
            "art/characters/hero.psd"
        );
        assert_eq!(repo_relative(&root, &cwd, "../bg.psd").unwrap(), "art/bg.psd");
    }

    #[test]
    fn test_repo_relative_accepts_absolute_paths() {
        let (_temp, root) = repo();
        let absolute = root.join("art/bg.psd");
        assert_eq!(
            repo_relative(&root, &root, absolute.to_str().unwrap()).unwrap(),
            "art/bg.psd"
        );
    }

    #[test]
    fn test_repo_relative_rejects_outside_and_root() {
        let (_temp, root) = repo();
        let err = repo_relative(&root, &root, "../elsewhere.psd").unwrap_err();
        assert!(err.to_string().contains("outside repository"));

        let err = repo_relative(&root, &root.join("art"), "..").unwrap_err();
        assert!(err.to_string().contains("repository root"));
    }

    #[test]
    fn test_repo_relative_rejects_tabs() {
        let (_temp, root) = repo();
        assert!(repo_relative(&root, &root, "bad\tname.psd").is_err());
    }

    #[test]
    fn test_normalize_targets_deduplicates() {
        let (_temp, root) = repo();
        let args = vec![
            "art/bg.psd".to_string(),
            "foo.psd".to_string(),
            "./art/../art/bg.psd".to_string(),
        ];
        assert_eq!(
            normalize_targets(&root, &root, &args).unwrap(),
            vec!["art/bg.psd", "foo.psd"]
        );
    }

    #[test]
    fn test_path_filter_none_without_patterns() {
        let (_temp, root) = repo();
        assert!(PathFilter::new(&root, &root, &[]).unwrap().is_none());
    }

    #[test]
    fn test_path_filter_directory_prefix() {
        let (_temp, root) = repo();
        let filter = PathFilter::new(&root, &root, &["art".to_string()])
            .unwrap()
            .unwrap();
        assert!(filter.matches("art/bg.psd"));
        assert!(filter.matches("art/characters/hero.psd"));
        assert!(!filter.matches("artwork/bg.psd"));
        assert!(!filter.matches("foo.psd"));
    }

    #[test]
    fn test_path_filter_globs_do_not_cross_directories() {
        let (_temp, root) = repo();
        let filter = PathFilter::new(&root, &root.join("art"), &["*.psd".to_string()])
            .unwrap()
            .unwrap();
        assert!(filter.matches("art/bg.psd"));
        assert!(!filter.matches("art/characters/hero.psd"));
        assert!(!filter.matches("bg.psd"));

        let deep = PathFilter::new(&root, &root, &["**/*.psd".to_string()])
            .unwrap()
            .unwrap();
        assert!(deep.matches("art/characters/hero.psd"));
    }

    #[test]
    fn test_path_filter_root_matches_everything() {
        let (_temp, root) = repo();
        let filter = PathFilter::new(&root, &root, &[".".to_string()])
            .unwrap()
            .unwrap();
        assert!(filter.matches("anything/at/all.bin"));
    }
}
