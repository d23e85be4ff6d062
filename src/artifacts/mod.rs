//! Git data structures and algorithms
//!
//! - `branch`: reference names and revision parsing
//! - `index`: index file records
//! - `log`: commit graph traversal
//! - `objects`: object types (blob, tree, commit, tag)

pub mod branch;
pub mod index;
pub mod log;
pub mod objects;
