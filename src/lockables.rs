//! Discovery of lockable files.
//!
//! A working repository may declare which files are usually locked in a
//! pattern file at its root (`.hglocks` by default). Those files are listed by
//! `locks --unlocked` even when nobody holds them. The file is optional;
//! without it nothing is declared lockable.
//!
//! # Pattern File Format
//!
//! ```text
//! # comments and blank lines are ignored
//! \.psd$                  # regular expression (the initial syntax)
//! syntax: glob
//! *.blend                 # glob, matched at any depth
//! re:^levels/.*\.umap$    # per-line prefix overrides the current syntax
//! rootglob:art/*.png      # glob anchored at the repository root
//! path:audio/master       # a file, or a directory and everything in it
//! ```

use crate::error::{Result, SimpleLockError};
use crate::git;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Pattern syntax in effect for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    /// Unanchored regular expression search.
    Regexp,
    /// Glob matched against any trailing run of path components.
    Glob,
    /// Glob matched against the whole repository-relative path.
    RootGlob,
    /// Literal file or directory path.
    Path,
}

impl Syntax {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "re" | "regexp" | "relre" => Some(Self::Regexp),
            "glob" | "relglob" => Some(Self::Glob),
            "rootglob" => Some(Self::RootGlob),
            "path" => Some(Self::Path),
            _ => None,
        }
    }
}

/// Compiled lockable patterns.
#[derive(Debug, Clone)]
pub struct LockablePatterns {
    regexes: Vec<Regex>,
    globs: GlobSet,
    paths: Vec<String>,
}

impl LockablePatterns {
    /// Parse pattern file content. Bad lines are logged and skipped.
    pub fn parse(content: &str, source: &str) -> Self {
        let mut syntax = Syntax::Regexp;
        let mut regexes = Vec::new();
        let mut builder = GlobSetBuilder::new();
        let mut paths = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let lineno = index + 1;
            let line = strip_comment(raw);
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix("syntax:") {
                match Syntax::from_name(name.trim()) {
                    Some(s) => syntax = s,
                    None => warn!(file = source, line = lineno, syntax = name.trim(), "ignoring unknown pattern syntax"),
                }
                continue;
            }

            let (kind, pattern) = split_kind(line).unwrap_or((syntax, line));
            match kind {
                Syntax::Regexp => match Regex::new(pattern) {
                    Ok(re) => regexes.push(re),
                    Err(e) => warn!(file = source, line = lineno, error = %e, "ignoring invalid regular expression"),
                },
                Syntax::Glob => {
                    let pattern = pattern.trim_start_matches("./");
                    for candidate in [format!("**/{}", pattern), format!("**/{}/**", pattern)] {
                        if let Err(e) = add_glob(&mut builder, &candidate) {
                            warn!(file = source, line = lineno, error = %e, "ignoring invalid glob");
                            break;
                        }
                    }
                }
                Syntax::RootGlob => {
                    if let Err(e) = add_glob(&mut builder, pattern.trim_start_matches("./")) {
                        warn!(file = source, line = lineno, error = %e, "ignoring invalid glob");
                    }
                }
                Syntax::Path => {
                    let path = pattern.trim_matches('/').trim_start_matches("./");
                    if !path.is_empty() {
                        paths.push(path.to_string());
                    }
                }
            }
        }

        let globs = builder.build().unwrap_or_else(|e| {
            warn!(file = source, error = %e, "ignoring glob patterns");
            GlobSet::empty()
        });

        Self {
            regexes,
            globs,
            paths,
        }
    }

    /// Whether no usable pattern was declared.
    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty() && self.globs.is_empty() && self.paths.is_empty()
    }

    /// Whether the repository-relative `path` is lockable.
    pub fn matches(&self, path: &str) -> bool {
        self.regexes.iter().any(|re| re.is_match(path))
            || self.globs.is_match(path)
            || self.paths.iter().any(|p| {
                path == p
                    || path
                        .strip_prefix(p.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }
}

fn add_glob(builder: &mut GlobSetBuilder, pattern: &str) -> std::result::Result<(), globset::Error> {
    let glob = GlobBuilder::new(pattern).literal_separator(true).build()?;
    builder.add(glob);
    Ok(())
}

/// Cut a `#` comment; `\#` is a literal `#`.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            other => out.push(other),
        }
    }
    out
}

fn split_kind(line: &str) -> Option<(Syntax, &str)> {
    let (prefix, rest) = line.split_once(':')?;
    Syntax::from_name(prefix).map(|kind| (kind, rest))
}

/// Tracked files of the working repository matched by its lockables file.
///
/// Returns an empty list when the file does not exist. Files are included
/// whether or not they have pending modifications.
pub fn read_lockables(repo_root: &Path, file_name: &str) -> Result<Vec<String>> {
    let path = repo_root.join(file_name);
    if !path.exists() {
        debug!(file = %path.display(), "no lockables file");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        SimpleLockError::UserError(format!("failed to read '{}': {}", path.display(), e))
    })?;

    let patterns = LockablePatterns::parse(&content, &path.display().to_string());
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    Ok(git::tracked_files(repo_root)?
        .into_iter()
        .filter(|file| patterns.matches(file))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_repo, git};

    fn parse(content: &str) -> LockablePatterns {
        LockablePatterns::parse(content, ".hglocks")
    }

    #[test]
    fn test_default_syntax_is_unanchored_regexp() {
        let patterns = parse("\\.psd$\n");
        assert!(patterns.matches("art/hero.psd"));
        assert!(patterns.matches("bg.psd"));
        assert!(!patterns.matches("art/hero.psd.bak"));

        let anchored = parse("^art/\n");
        assert!(anchored.matches("art/hero.psd"));
        assert!(!anchored.matches("src/art/hero.psd"));
    }

    #[test]
    fn test_glob_syntax_matches_at_any_depth() {
        let patterns = parse("syntax: glob\n*.blend\nlevels\n");
        assert!(patterns.matches("model.blend"));
        assert!(patterns.matches("assets/chars/model.blend"));
        assert!(!patterns.matches("assets/model.blend1"));
        // A matching directory name covers everything below it.
        assert!(patterns.matches("game/levels/one.umap"));
    }

    #[test]
    fn test_per_line_prefixes_override_syntax() {
        let patterns = parse("syntax: glob\nre:^docs/.*\\.pdf$\nrootglob:art/*.png\npath:audio/master\n");
        assert!(patterns.matches("docs/spec.pdf"));
        assert!(patterns.matches("art/logo.png"));
        assert!(!patterns.matches("old/art/logo.png"));
        assert!(!patterns.matches("art/icons/logo.png"));
        assert!(patterns.matches("audio/master"));
        assert!(patterns.matches("audio/master/mix.wav"));
        assert!(!patterns.matches("audio/mastering.wav"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let patterns = parse("# binary art\n\n\\.psd$   # photoshop\nissue\\#1\n");
        assert!(patterns.matches("a.psd"));
        assert!(patterns.matches("notes/issue#1.txt"));
        assert!(!patterns.matches("README.md"));
    }

    #[test]
    fn test_invalid_lines_are_skipped() {
        let patterns = parse("(unclosed\nsyntax: bogus\n\\.psd$\n");
        assert!(patterns.matches("a.psd"));
        assert!(!patterns.is_empty());

        assert!(parse("# nothing here\n").is_empty());
    }

    #[test]
    fn test_read_lockables_without_file_is_empty() {
        let temp_dir = create_test_repo();
        assert!(read_lockables(temp_dir.path(), ".hglocks").unwrap().is_empty());
    }

    #[test]
    fn test_read_lockables_lists_clean_and_modified_tracked_files() {
        let temp_dir = create_test_repo();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("art")).unwrap();
        std::fs::write(root.join("art/hero.psd"), "hero").unwrap();
        std::fs::write(root.join("art/bg.psd"), "bg").unwrap();
        std::fs::write(root.join(".hglocks"), "syntax: glob\n*.psd\n").unwrap();
        git(root, &["add", "."]);
        git(root, &["commit", "-q", "-m", "Add art"]);

        // One modified, one clean, one untracked.
        std::fs::write(root.join("art/hero.psd"), "hero v2").unwrap();
        std::fs::write(root.join("art/new.psd"), "untracked").unwrap();

        let mut lockables = read_lockables(root, ".hglocks").unwrap();
        lockables.sort();
        assert_eq!(lockables, vec!["art/bg.psd", "art/hero.psd"]);
    }
}
