//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{Result, SimpleLockError};
use crate::git;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Git config section holding all simplelock settings.
pub const CONFIG_SECTION: &str = "simplelock";

impl Config {
    /// Load config from the git configuration visible in `repo_root`.
    ///
    /// This covers system, global and repository-local git config, with the
    /// usual git precedence (later sources win).
    pub fn load<P: AsRef<Path>>(repo_root: P) -> Result<Self> {
        let repo_root = repo_root.as_ref();
        let pattern = format!(r"^{}\.", CONFIG_SECTION);
        let entries = git::config_entries(repo_root, &pattern)?;
        let mut config = Self::from_entries(entries)?;

        // Let git expand `~/` in the registry path the way it does for path-typed keys.
        if config.repo.as_deref().is_some_and(|r| r.starts_with('~')) {
            let key = format!("{}.repo", CONFIG_SECTION);
            if let Some(out) = git::try_run_git(repo_root, &["config", "--type=path", "--get", &key])? {
                config.repo = Some(out.stdout);
            }
        }

        debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Build a config from `(key, value)` pairs such as `("simplelock.repo", "/srv/locks")`.
    ///
    /// Keys outside the `simplelock.` section are ignored, as are unknown keys
    /// inside it. Empty values count as unset. When a key repeats, the last
    /// value wins.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = Map::new();
        for (key, value) in entries {
            let Some(name) = key
                .as_ref()
                .strip_prefix(CONFIG_SECTION)
                .and_then(|k| k.strip_prefix('.'))
            else {
                continue;
            };

            let value: String = value.into();
            if value.is_empty() {
                map.remove(name);
                continue;
            }
            map.insert(name.to_ascii_lowercase(), Value::String(value));
        }

        serde_json::from_value(Value::Object(map)).map_err(|e| {
            SimpleLockError::ConfigError(format!("invalid {} configuration: {}", CONFIG_SECTION, e))
        })
    }

    /// Replace the configured lock repository (from `--lock-repo` or `SIMPLELOCK_REPO`).
    pub fn with_repo_override(mut self, repo: Option<&Path>) -> Self {
        if let Some(repo) = repo {
            self.repo = Some(repo.to_string_lossy().to_string());
        }
        self
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `repo` must be set
    /// - `remote` must be non-empty
    /// - `username` and `purpose` must not contain tabs or newlines
    pub fn validate(&self) -> Result<()> {
        if self.repo.as_deref().is_none_or(|r| r.trim().is_empty()) {
            return Err(SimpleLockError::ConfigError(format!(
                "No lock repository configured.\n\n\
                 Point {section}.repo at a local clone of the shared lock repository:\n\
                 git config {section}.repo /path/to/lock-repo-clone",
                section = CONFIG_SECTION
            )));
        }

        if self.remote.trim().is_empty() {
            return Err(SimpleLockError::ConfigError(format!(
                "config validation failed: {}.remote must not be empty",
                CONFIG_SECTION
            )));
        }

        let text_fields = [
            ("username", self.username.as_deref()),
            ("purpose", Some(self.purpose.as_str())),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value
                && value.contains(['\t', '\n', '\r'])
            {
                return Err(SimpleLockError::ConfigError(format!(
                    "config validation failed: {}.{} must not contain tabs or newlines",
                    CONFIG_SECTION, name
                )));
            }
        }

        Ok(())
    }

    /// Absolute location of the lock repository clone.
    ///
    /// A `file://` prefix is accepted; relative paths are resolved against
    /// `repo_root`.
    pub fn mirror_path<P: AsRef<Path>>(&self, repo_root: P) -> Result<PathBuf> {
        let raw = self.repo.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(SimpleLockError::ConfigError(
                "No lock repository configured".to_string(),
            ));
        }

        let path = PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw));
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(repo_root.as_ref().join(path))
        }
    }
}
