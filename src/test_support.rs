use crate::context::{LockContext, LockScope, RegistryLocation};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A git repository on branch `main` with a single commit.
pub(crate) fn create_test_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    init_work_repo(temp_dir.path(), &[("README.md", "# Test\n")]);
    temp_dir
}

fn init_work_repo(path: &Path, files: &[(&str, &str)]) {
    std::fs::create_dir_all(path).unwrap();
    git(path, &["init", "-q"]);
    // Ensure the repo uses a deterministic default branch name across environments.
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure_identity(path, "Test User", "test@example.com");

    for (name, content) in files {
        let file = path.join(name);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file, content).unwrap();
    }
    git(path, &["add", "."]);
    git(path, &["commit", "-q", "-m", "Initial commit"]);
}

fn configure_identity(path: &Path, name: &str, email: &str) {
    git(path, &["config", "user.email", email]);
    git(path, &["config", "user.name", name]);
}

/// A shared lock registry (bare upstream), a working repository, and helpers
/// to create any number of mirror clones of the registry.
pub(crate) struct LockFixture {
    _temp: TempDir,
    pub root: PathBuf,
    pub upstream: PathBuf,
    pub work: PathBuf,
}

impl LockFixture {
    /// Upstream registry with one commit that does not contain `locked` yet.
    pub(crate) fn new() -> Self {
        let fixture = Self::new_empty_upstream();
        let seed = fixture.root.join("seed");
        git(&fixture.root, &["clone", "-q", path_str(&fixture.upstream), "seed"]);
        configure_identity(&seed, "Seeder", "seed@example.com");
        std::fs::write(seed.join("README"), "lock registry\n").unwrap();
        git(&seed, &["add", "README"]);
        git(&seed, &["commit", "-q", "-m", "Create lock registry"]);
        git(&seed, &["push", "-q", "origin", "HEAD:refs/heads/main"]);
        fixture
    }

    /// Upstream registry without any history.
    pub(crate) fn new_empty_upstream() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();

        let upstream = root.join("upstream.git");
        std::fs::create_dir_all(&upstream).unwrap();
        git(&upstream, &["init", "-q", "--bare"]);
        git(&upstream, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let work = root.join("work");
        init_work_repo(
            &work,
            &[
                ("README.md", "# Game\n"),
                ("art/hero.psd", "hero"),
                ("art/bg.psd", "background"),
                ("docs/notes.txt", "notes\n"),
            ],
        );

        Self {
            _temp: temp,
            root,
            upstream,
            work,
        }
    }

    /// Clone the upstream registry into a new mirror directory.
    pub(crate) fn clone_mirror(&self, name: &str) -> PathBuf {
        git(&self.root, &["clone", "-q", path_str(&self.upstream), name]);
        let mirror = self.root.join(name);
        // An empty upstream clones onto git's default branch; pin it.
        git(&mirror, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        configure_identity(&mirror, name, &format!("{}@example.com", name));
        mirror
    }

    /// Build the explicit context for `username` working through `mirror`.
    pub(crate) fn context(&self, mirror: &Path, username: &str) -> LockContext {
        LockContext {
            repo_root: self.work.clone(),
            scope: LockScope {
                repo_id: crate::git::root_commit(&self.work).unwrap(),
                branch: "main".to_string(),
            },
            username: username.to_string(),
            registry: RegistryLocation {
                mirror: mirror.to_path_buf(),
                remote: "origin".to_string(),
                branch: Some("main".to_string()),
            },
            lockables_file: ".hglocks".to_string(),
            default_purpose: "editing".to_string(),
        }
    }

    /// Contents of `locked` at the upstream tip, `None` if absent.
    pub(crate) fn upstream_registry(&self) -> Option<String> {
        let output = Command::new("git")
            .current_dir(&self.upstream)
            .args(["show", "main:locked"])
            .output()
            .unwrap();
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            None
        }
    }

    /// Publish `content` as the upstream `locked` file.
    pub(crate) fn seed_registry(&self, content: &str) {
        let scratch = self.root.join("scratch");
        if !scratch.exists() {
            git(&self.root, &["clone", "-q", path_str(&self.upstream), "scratch"]);
            configure_identity(&scratch, "Scratch", "scratch@example.com");
        }
        git(&scratch, &["pull", "-q", "--ff-only", "origin", "main"]);
        std::fs::write(scratch.join("locked"), content).unwrap();
        git(&scratch, &["add", "locked"]);
        git(&scratch, &["commit", "-q", "-m", "Seed registry"]);
        git(&scratch, &["push", "-q", "origin", "HEAD:refs/heads/main"]);
    }

    /// Hash of the upstream tip.
    pub(crate) fn upstream_tip(&self) -> String {
        let output = Command::new("git")
            .current_dir(&self.upstream)
            .args(["rev-parse", "main"])
            .output()
            .unwrap();
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Run git and panic with full output on failure.
pub(crate) fn git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }
}
