//! The shared lock registry.
//!
//! The registry is a single line-oriented file named `locked` inside a
//! dedicated git repository. Every client works through a private clone (the
//! mirror) that is forced back to the published state before each operation
//! and publishes its own changes with commit + push.
//!
//! # Line Format
//!
//! ```text
//! <repo-id>\t<branch>\t<path>\t<owner>\t<purpose>\n
//! ```
//!
//! Lines that do not split into exactly five fields are skipped when reading
//! and left untouched when the file is rewritten.

pub mod codec;
pub mod mirror;
pub mod state;

/// Name of the registry file inside the lock repository.
pub const REGISTRY_FILE: &str = "locked";

pub use codec::LockRecord;
pub use mirror::{Mirror, PublishOutcome};
pub use state::{LockMap, parse_locks};
