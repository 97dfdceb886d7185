//! CLI argument parsing for simplelock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Simplelock: advisory file locks for git repositories.
///
/// Locks are recorded in a shared lock repository, one line per locked file.
/// Every command first brings the local clone of that repository up to date,
/// so what it reports and decides is based on the published locks.
#[derive(Parser, Debug)]
#[command(name = "simplelock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Local clone of the lock repository (overrides simplelock.repo).
    #[arg(long, global = true, env = "SIMPLELOCK_REPO", value_name = "PATH")]
    pub lock_repo: Option<PathBuf>,

    /// Show progress of git operations (-vv for every git command).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for simplelock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List locked files.
    ///
    /// With --unlocked, also lists files declared lockable by the
    /// repository's lockables file that nobody holds.
    Locks(LocksArgs),

    /// Lock files.
    ///
    /// Fails without changing anything if any of the files is already locked.
    Lock(LockArgs),

    /// Unlock files.
    ///
    /// Only your own locks are removed unless --force is given. Fails without
    /// changing anything unless every file was locked.
    Unlock(UnlockArgs),
}

/// Arguments for the `locks` command.
#[derive(Parser, Debug)]
pub struct LocksArgs {
    /// Also list lockable files that are not locked.
    #[arg(short, long)]
    pub unlocked: bool,

    /// Print the listing as JSON.
    #[arg(long)]
    pub json: bool,

    /// Only list these files, directories or glob patterns.
    pub patterns: Vec<String>,
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Reason for locking, shown to others (defaults to simplelock.purpose).
    #[arg(short, long, value_name = "TEXT")]
    pub purpose: Option<String>,

    /// Files to lock.
    #[arg(required = true)]
    pub files: Vec<String>,
}

/// Arguments for the `unlock` command.
#[derive(Parser, Debug)]
pub struct UnlockArgs {
    /// Remove locks held by other users too.
    #[arg(short, long)]
    pub force: bool,

    /// Files to unlock.
    #[arg(required = true)]
    pub files: Vec<String>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_locks_defaults() {
        let cli = Cli::try_parse_from(["simplelock", "locks"]).unwrap();
        if let Command::Locks(args) = cli.command {
            assert!(!args.unlocked);
            assert!(!args.json);
            assert!(args.patterns.is_empty());
        } else {
            panic!("Expected Locks command");
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_locks_unlocked_with_patterns() {
        let cli = Cli::try_parse_from(["simplelock", "locks", "-u", "art", "*.psd"]).unwrap();
        if let Command::Locks(args) = cli.command {
            assert!(args.unlocked);
            assert_eq!(args.patterns, vec!["art", "*.psd"]);
        } else {
            panic!("Expected Locks command");
        }
    }

    #[test]
    fn parse_lock_with_purpose() {
        let cli = Cli::try_parse_from([
            "simplelock",
            "lock",
            "-p",
            "retouching",
            "hero.psd",
            "bg.psd",
        ])
        .unwrap();
        if let Command::Lock(args) = cli.command {
            assert_eq!(args.purpose.as_deref(), Some("retouching"));
            assert_eq!(args.files, vec!["hero.psd", "bg.psd"]);
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_requires_files() {
        assert!(Cli::try_parse_from(["simplelock", "lock"]).is_err());
        assert!(Cli::try_parse_from(["simplelock", "unlock", "-f"]).is_err());
    }

    #[test]
    fn parse_unlock_force() {
        let cli = Cli::try_parse_from(["simplelock", "unlock", "--force", "hero.psd"]).unwrap();
        if let Command::Unlock(args) = cli.command {
            assert!(args.force);
            assert_eq!(args.files, vec!["hero.psd"]);
        } else {
            panic!("Expected Unlock command");
        }
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "simplelock",
            "unlock",
            "hero.psd",
            "--lock-repo",
            "/srv/locks",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.lock_repo, Some(PathBuf::from("/srv/locks")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn parse_unknown_command_fails() {
        assert!(Cli::try_parse_from(["simplelock", "steal", "hero.psd"]).is_err());
    }
}
