//! Command implementations behind the `bit` binary
//!
//! - `plumbing`: object-level commands (hash-object, cat-file, rev-list)
//! - `porcelain`: user-facing commands (init, add, commit, branch, tag, log)
//!
//! Every command is a method on [`Repository`](crate::areas::repository::Repository)
//! writing its output to the repository's writer.

pub mod plumbing;
pub mod porcelain;
