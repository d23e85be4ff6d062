//! A small git-compatible repository core
//!
//! The crate stores loose objects, stages paths in a git v2 index, manages
//! references and walks the commit graph. [`Repository`] is the entry point:
//!
//! ```no_run
//! use bitgraph::{Repository, SortFlags};
//!
//! # fn main() -> bitgraph::Result<()> {
//! let repository = Repository::open(std::path::Path::new("."))?;
//! for commit in repository.commits_from("HEAD", SortFlags::TOPOLOGICAL)? {
//!     let commit = commit?;
//!     println!("{} {}", commit.oid.to_short_oid(), commit.commit.summary());
//! }
//! # Ok(())
//! # }
//! ```

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;

pub use areas::repository::Repository;
pub use artifacts::log::rev_list::{RevList, SortFlags, WalkedCommit};
pub use artifacts::objects::object::ObjectBox;
pub use artifacts::objects::object_id::ObjectId;
pub use artifacts::objects::object_type::ObjectType;
pub use errors::{RepositoryError, Result};
pub use commands::porcelain::log::{CommitDecoration, CommitDisplayFormat, LogOptions};
