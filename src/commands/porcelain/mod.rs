//! Porcelain commands
//!
//! - `init`: create a repository
//! - `add`: stage files
//! - `commit`: record the staged snapshot
//! - `branch`: list or create branches
//! - `tag`: list or create annotated tags
//! - `log`: show commit history

pub mod add;
pub mod branch;
pub mod commit;
pub mod init;
pub mod log;
pub mod tag;
