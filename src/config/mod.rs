//! Configuration for simplelock.
//!
//! Settings live in git config under the `simplelock.` section, so they can be
//! set per repository, per user or system-wide with plain `git config`.
//! Unknown keys are ignored for forward compatibility.

mod model;
mod operations;


pub use model::Config;
